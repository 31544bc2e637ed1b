use crate::{MigrationError, MigrationTrait, RawTable};
use std::collections::HashSet;
use uuid::Uuid;

const ID: &str = "ID";

pub struct Migration;

impl MigrationTrait for Migration {
    fn name(&self) -> &'static str {
        "m20240315_000001_add_trade_ids"
    }

    /// Give every row an identifier. Adds the `ID` column in front when it is
    /// missing and fills blank cells when it exists.
    fn up(&self, table: &mut RawTable) -> Result<(), MigrationError> {
        match table.column(ID) {
            None => {
                table.insert_column(0, ID, |_| Uuid::new_v4().to_string());
            }
            Some(idx) => {
                let mut seen = HashSet::new();
                for row in table.rows.iter_mut() {
                    let cell = row[idx].trim().to_string();
                    if cell.is_empty() {
                        row[idx] = Uuid::new_v4().to_string();
                    } else if !seen.insert(cell.clone()) {
                        return Err(MigrationError::Step {
                            name: self.name().to_string(),
                            reason: format!("duplicate identifier {}", cell),
                        });
                    }
                }
            }
        }
        Ok(())
    }
}
