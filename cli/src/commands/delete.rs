use anyhow::Result;
use clap::Args;
use std::io::{BufRead, Write};

use super::{print_trade, resolve_id};
use crate::state::AppState;

#[derive(Debug, Args)]
pub struct DeleteArgs {
    /// Trade id, or a unique prefix of it
    pub id: String,

    /// Skip the confirmation prompt
    #[arg(long, short)]
    pub yes: bool,
}

/// `y`/`yes`/`是` confirm; anything else, including end of input, cancels
fn confirmed(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes" | "是")
}

fn prompt(reader: &mut impl BufRead, writer: &mut impl Write) -> Result<bool> {
    write!(writer, "确定要删除这条记录吗？此操作不可恢复。[y/N] ")?;
    writer.flush()?;
    let mut answer = String::new();
    reader.read_line(&mut answer)?;
    Ok(confirmed(&answer))
}

pub fn handle_delete(state: &AppState, args: DeleteArgs) -> Result<()> {
    let id = resolve_id(state, &args.id)?;
    let record = state.repository.get(&id)?;

    if !args.yes {
        print_trade(&record);
        if !prompt(&mut std::io::stdin().lock(), &mut std::io::stdout())? {
            println!("已取消");
            return Ok(());
        }
    }

    state.repository.delete(&id)?;
    println!("记录已删除!");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delete_by_prefix_without_prompt() {
        let dir = tempfile::tempdir().unwrap();
        let state = crate::state::testing::state_in(dir.path());
        let buy_time = crate::commands::parse_time("2024-03-01").unwrap();
        let created = state
            .repository
            .create(shared::TradeFields::new("600519", buy_time, rust_decimal::dec!(1700), 100))
            .unwrap();

        let prefix: String = created.id().as_str().chars().take(8).collect();
        handle_delete(&state, DeleteArgs { id: prefix, yes: true }).unwrap();
        assert!(state.repository.list().unwrap().is_empty());

        let missing = handle_delete(&state, DeleteArgs { id: created.id().to_string(), yes: true });
        assert!(missing.is_err());
    }

    #[test]
    fn test_confirmation_answers() {
        assert!(confirmed("y\n"));
        assert!(confirmed(" YES "));
        assert!(confirmed("是"));
        assert!(!confirmed(""));
        assert!(!confirmed("n"));
    }

    #[test]
    fn test_prompt_reads_one_line() {
        let mut output = Vec::new();
        assert!(prompt(&mut "y\nn\n".as_bytes(), &mut output).unwrap());
        assert!(!prompt(&mut "".as_bytes(), &mut output).unwrap());
        assert!(String::from_utf8(output).unwrap().contains("[y/N]"));
    }
}
