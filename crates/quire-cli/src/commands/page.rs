//! Page command handlers

use std::env;
use std::fs;
use std::io::{self, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{bail, Context, Result};

use quire_core::{Block, Config, EditorAdapter, Page, PageId, SaveEvent, SelectOutcome};

use super::Session;
use crate::output::Output;

/// List all pages
pub async fn list(config: &Config, output: &Output) -> Result<()> {
    let session = Session::open(config).await?;
    output.print_pages(&session.controller.pages());
    session.controller.shutdown().await;
    Ok(())
}

/// Show a single page, fetched fresh from the server
pub async fn show(config: &Config, id: String, output: &Output) -> Result<()> {
    let session = Session::open(config).await?;
    let page = open_page(&session, &id).await?;
    output.print_page(&page);
    session.controller.shutdown().await;
    Ok(())
}

/// Create a new page, optionally seeded from a JSON file of blocks
pub async fn create(
    config: &Config,
    title: Option<String>,
    file: Option<PathBuf>,
    output: &Output,
) -> Result<()> {
    let session = Session::open(config).await?;

    // New pages start from whatever the editor holds
    let blocks = match file {
        Some(path) => read_blocks(&path)?,
        None => Vec::new(),
    };
    session.editor.replace_document(blocks);

    let created = match title {
        Some(title) => session.controller.create_page_with_title(&title).await,
        None => session.controller.create_page().await,
    };
    let page = created.context("Failed to create page")?;

    output.success(&format!("Created page: {}", page.id));
    output.print_page(&page);
    session.controller.shutdown().await;
    Ok(())
}

/// Rename a page
pub async fn rename(config: &Config, id: String, title: String, output: &Output) -> Result<()> {
    let session = Session::open(config).await?;

    let page = session
        .controller
        .rename_page(&PageId::from(id.as_str()), &title)
        .await
        .with_context(|| format!("Failed to rename page {}", id))?;

    output.success(&format!("Renamed page {} to '{}'", page.id, page.title));
    session.controller.shutdown().await;
    Ok(())
}

/// Delete a page
pub async fn delete(config: &Config, id: String, output: &Output) -> Result<()> {
    let session = Session::open(config).await?;
    let page_id = PageId::from(id.as_str());

    if output.should_prompt() {
        let title = session
            .controller
            .pages()
            .into_iter()
            .find(|p| p.id == page_id)
            .map(|p| p.title)
            .unwrap_or_default();
        println!("Delete page: {} - {}", page_id, title);
        if !confirm_delete()? {
            println!("Cancelled.");
            return Ok(());
        }
    }

    session
        .controller
        .delete_page(&page_id)
        .await
        .with_context(|| format!("Failed to delete page {}", id))?;

    output.success(&format!("Deleted page: {}", page_id));
    session.controller.shutdown().await;
    Ok(())
}

/// Edit a page's blocks as JSON in $EDITOR
///
/// The edited document goes through the editor buffer like a keystroke
/// would, so the background save engine writes it.
pub async fn edit(config: &Config, id: String, output: &Output) -> Result<()> {
    let mut session = Session::open(config).await?;
    let page = open_page(&session, &id).await?;

    let blocks = edit_blocks(&page.blocks)?;

    if blocks == page.blocks {
        output.message("No changes.");
        session.controller.shutdown().await;
        return Ok(());
    }

    let mut events = session
        .controller
        .take_save_events()
        .context("Save events already taken")?;

    session.editor.apply_edit(blocks);
    output.message("Saving...");

    let event = events.recv().await;
    let status = session.controller.save_status();
    session.controller.shutdown().await;

    match event {
        Some(SaveEvent::Saved { page_id, .. }) => {
            output.success(&format!("Saved page: {}", page_id));
            output.print_save_status(&status);
            Ok(())
        }
        Some(SaveEvent::Failed { page_id, error }) => {
            output.print_save_status(&status);
            Err(error).with_context(|| format!("Failed to save page {}", page_id))
        }
        Some(SaveEvent::Discarded { page_id }) => {
            bail!("Page {} was deleted before the edit could be saved", page_id)
        }
        None => bail!("Save engine stopped before the edit was saved"),
    }
}

/// Select a page and return the fresh copy the server sent
async fn open_page(session: &Session, id: &str) -> Result<Page> {
    let outcome = session
        .controller
        .select_page(&PageId::from(id))
        .await
        .with_context(|| format!("Failed to load page {}", id))?;

    match outcome {
        SelectOutcome::Selected(page) => Ok(page),
        SelectOutcome::Discarded => bail!("Page {} is no longer available", id),
    }
}

/// Read a JSON array of blocks from a file
fn read_blocks(path: &Path) -> Result<Vec<Block>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read blocks file: {:?}", path))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Blocks file is not a JSON array of blocks: {:?}", path))
}

/// Round-trip `blocks` through the user's editor as pretty JSON
fn edit_blocks(blocks: &[Block]) -> Result<Vec<Block>> {
    let command = editor_command(env::var("VISUAL").ok(), env::var("EDITOR").ok());
    let (program, args) = split_command(&command)?;

    let mut file = tempfile::Builder::new()
        .prefix("quire-")
        .suffix(".json")
        .tempfile()
        .context("Failed to create a scratch file for the editor")?;
    serde_json::to_writer_pretty(file.as_file_mut(), blocks)?;
    file.as_file_mut().flush()?;

    let status = Command::new(program)
        .args(args)
        .arg(file.path())
        .status()
        .with_context(|| format!("Failed to run editor: {}", command))?;
    if !status.success() {
        bail!("Editor '{}' exited with {}", command, status);
    }

    read_blocks(file.path()).context("Edited content is not a JSON array of blocks")
}

/// Editor to launch: $VISUAL, then $EDITOR, then `vi`
fn editor_command(visual: Option<String>, editor: Option<String>) -> String {
    [visual, editor]
        .into_iter()
        .flatten()
        .map(|value| value.trim().to_string())
        .find(|value| !value.is_empty())
        .unwrap_or_else(|| "vi".to_string())
}

/// Split an editor setting such as `code --wait` into program and arguments
fn split_command(command: &str) -> Result<(&str, Vec<&str>)> {
    let mut parts = command.split_whitespace();
    match parts.next() {
        Some(program) => Ok((program, parts.collect())),
        None => bail!("Editor command is empty"),
    }
}

/// Ask before deleting; anything but y/yes declines, as does a non-terminal stdin
fn confirm_delete() -> Result<bool> {
    let stdin = io::stdin();
    if !stdin.is_terminal() {
        return Ok(false);
    }

    print!("Are you sure? [y/N] ");
    io::stdout().flush()?;

    let mut answer = String::new();
    stdin.read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}
