use crate::{MigrationError, MigrationTrait, RawTable};

const LEGACY_CONFIRMATION: &str = "印证";
const CONFIRMATION: &str = "两点印证";

pub struct Migration;

impl MigrationTrait for Migration {
    fn name(&self) -> &'static str {
        "m20240301_000001_rename_confirmation_column"
    }

    fn up(&self, table: &mut RawTable) -> Result<(), MigrationError> {
        // Files that already carry the new column keep it; the legacy one is left alone.
        if table.has_column(LEGACY_CONFIRMATION) && !table.has_column(CONFIRMATION) {
            table.rename_column(LEGACY_CONFIRMATION, CONFIRMATION);
        }
        Ok(())
    }
}
