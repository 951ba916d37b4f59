use std::path::Path;

use crate::cli::commands::InitArgs;
use crate::io::project_io::{self, BOARD_DIR};

/// Infer a board name from a directory name: replace hyphens and underscores
/// with spaces, title-case.
fn infer_name(dir_name: &str) -> String {
    dir_name
        .split(['-', '_'])
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                None => String::new(),
                Some(c) => {
                    let upper: String = c.to_uppercase().collect();
                    upper + chars.as_str()
                }
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn cmd_init(args: InitArgs, start: &Path) -> Result<(), Box<dyn std::error::Error>> {
    // Note an enclosing board; the new one will shadow it below this directory
    if let Some(parent) = start.parent()
        && let Ok(parent_root) = project_io::discover_board(parent)
    {
        eprintln!(
            "Note: enclosing board found at {}/",
            parent_root.join(BOARD_DIR).display()
        );
    }

    let name = args.name.unwrap_or_else(|| {
        start
            .file_name()
            .and_then(|n| n.to_str())
            .map(infer_name)
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| "Task Board".to_string())
    });

    let board = project_io::init_board(start, &name, args.force)?;
    println!("Initialized task board: {}", board.config.board.name);
    Ok(())
}
