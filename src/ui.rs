// UI layer: interactive menu built on `dialoguer`, spinners from
// `indicatif`, colored notices through `crossterm`.
//
// All state lives in the `Controller`; this module only reads user input,
// calls into it and prints what comes back.

use crate::api::{ApiClient, SimilarityService};
use crate::controller::{Completion, Controller, ViewState};
use crate::error::Notice;
use crate::render::ResultsView;
use crate::selection::SelectedImage;
use anyhow::{Context, Result};
use crossterm::style::Stylize;
use dialoguer::{Input, Select};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Duration;

/// Extensions offered by the file picker dialog.
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp", "bmp"];

const MENU: &[&str] = &[
    "Load image from URL",
    "Load image from file",
    "Pick image file (dialog)",
    "Show preview",
    "Find similar images",
    "Save matches to folder",
    "Exit",
];

/// Main interactive menu. Runs until the user chooses "Exit".
///
/// Note: `Select::interact()` is keyboard-driven: arrow keys and Enter.
pub fn main_menu(api: ApiClient) -> Result<()> {
    println!("Similarity service: {}", api.base_url());
    let mut controller = Controller::new(api);

    loop {
        let selection = Select::new()
            .with_prompt(status_line(controller.state()))
            .items(MENU)
            .default(0)
            .interact()?;
        match selection {
            0 => {
                let url: String = Input::new().with_prompt("Image URL").interact_text()?;
                load_url(&mut controller, &url);
            }
            1 => {
                let path: String = Input::new().with_prompt("Image file path").interact_text()?;
                load_file(&mut controller, PathBuf::from(path.trim()));
            }
            2 => {
                let picked = rfd::FileDialog::new()
                    .add_filter("Images", IMAGE_EXTENSIONS)
                    .pick_file();
                match picked {
                    Some(path) => load_file(&mut controller, path),
                    None => println!("No file chosen."),
                }
            }
            3 => match controller.selection() {
                Some(image) => print_preview(image, true),
                None => show_notice(&Notice::NoImageSelected),
            },
            4 => run_search(&mut controller),
            5 => {
                if let Err(e) = save_matches(&controller) {
                    println!("{}", format!("Save failed: {:#}", e).red());
                }
            }
            6 => break,
            _ => {}
        }
    }
    Ok(())
}

/// Fetch `url` on a worker thread while a spinner runs, then hand the
/// outcome to the controller.
pub fn load_url(controller: &mut Controller<ApiClient>, url: &str) {
    let pending = controller.spawn_url_acquisition(url);
    let ticket = pending.ticket();
    let spinner = spinner("Downloading image...");
    let outcome = pending.wait();
    spinner.finish_and_clear();

    match controller.complete_acquisition(ticket, outcome) {
        Ok(Completion::Applied) => {
            if let Some(image) = controller.selection() {
                print_preview(image, false);
            }
        }
        Ok(Completion::Stale) => {}
        Err(notice) => show_notice(&notice),
    }
}

pub fn load_file(controller: &mut Controller<ApiClient>, path: PathBuf) {
    match controller.select_by_file(&path) {
        Ok(image) => print_preview(image, false),
        Err(notice) => show_notice(&notice),
    }
}

/// Submit the current selection and print the results grid.
pub fn run_search(controller: &mut Controller<ApiClient>) {
    if controller.selection().is_none() {
        show_notice(&Notice::NoImageSelected);
        return;
    }
    let spinner = spinner("Searching for similar images...");
    let outcome = controller.submit();
    spinner.finish_and_clear();
    match outcome {
        Ok(results) => print_results(&results),
        Err(notice) => show_notice(&notice),
    }
}

fn save_matches(controller: &Controller<ApiClient>) -> Result<()> {
    let results = match controller.results() {
        Some(ResultsView::Matches(items)) => items.clone(),
        Some(ResultsView::Empty) | None => {
            println!("Nothing to save: run a search with matches first.");
            return Ok(());
        }
    };
    let dir: String = Input::new()
        .with_prompt("Target folder")
        .default("matches".into())
        .interact_text()?;
    let dir = PathBuf::from(dir);

    let bar = ProgressBar::new(results.len() as u64);
    bar.set_style(
        ProgressStyle::with_template("{bar:30} {pos}/{len} {msg}")
            .context("Invalid progress template")?,
    );
    for m in &results {
        bar.set_message(m.path.clone());
        let written = controller.service().download_match(&m.path, &dir)?;
        tracing::debug!(path = %written.display(), "saved match");
        bar.inc(1);
    }
    bar.finish_and_clear();
    println!("Saved {} image(s) to {}", results.len(), dir.display());
    Ok(())
}

fn spinner(msg: &'static str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(msg);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

fn status_line(state: &ViewState) -> String {
    match state {
        ViewState::Idle => "No image selected".to_string(),
        ViewState::Previewing(image) => format!("Previewing {}", image.name()),
        ViewState::ShowingResults { image, results } => {
            format!("{}: {} match(es)", image.name(), results.images().len())
        }
    }
}

pub fn show_notice(notice: &Notice) {
    println!("{}", notice.to_string().yellow());
}

/// Print the selection. With `full` the data URI is shown too (it can be
/// pasted into a browser address bar).
pub fn print_preview(image: &SelectedImage, full: bool) {
    println!("{} {}", "Preview:".bold(), image.describe());
    if full {
        println!("{}", image.data_uri());
    }
}

pub fn print_results(results: &ResultsView) {
    println!("{}", "Similar images".bold());
    for line in results.lines() {
        println!("{}", line);
    }
}
