//! Attaches term trees from a settings payload and prints what the user
//! would see after the page finished loading.
//!
//! Usage:
//!   term-tree-demo <settings.json> <fixture.json>
//!
//! The settings file is the host payload (`term_reference_fancytree` key);
//! the fixture file lists the children served for each (parent, vocab)
//! request. Set `RUST_LOG=debug` to follow the expansion.

mod render;

use anyhow::{Context, Result};
use futures::executor::block_on;
use log::info;
use std::cell::RefCell;
use std::env;
use std::fmt::Write;
use std::fs;
use std::path::Path;
use std::rc::Rc;
use term_tree::prelude::*;
use term_tree::FixtureEntry;

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let [_, settings, fixture] = args.as_slice() else {
        eprintln!("Usage: term-tree-demo <settings.json> <fixture.json>");
        std::process::exit(2);
    };

    print!("{}", run(Path::new(settings), Path::new(fixture))?);
    Ok(())
}

/// Attach and start every configured tree, returning the printed report
fn run(settings_path: &Path, fixture_path: &Path) -> Result<String> {
    let settings = fs::read_to_string(settings_path)
        .with_context(|| format!("Failed to read settings {}", settings_path.display()))?;
    let settings = AttachSettings::from_json(&settings)?;

    let fixture = fs::read_to_string(fixture_path)
        .with_context(|| format!("Failed to read fixture {}", fixture_path.display()))?;
    let fixture: Vec<FixtureEntry> = serde_json::from_str(&fixture)
        .with_context(|| format!("Failed to parse fixture {}", fixture_path.display()))?;
    let source = Rc::new(StaticSource::from_fixture(fixture));

    let form = Rc::new(RefCell::new(FormState::new()));
    let mut attacher = Attacher::new(TreeOptions::default());
    let mut controllers = attacher.attach(&settings, &form, |_| Rc::clone(&source));
    info!("Attached {} tree(s)", controllers.len());

    let reports = block_on(start_all(&mut controllers));

    let mut out = String::new();
    for (controller, report) in controllers.iter().zip(&reports) {
        writeln!(out, "#{} ({})", controller.id(), controller.field_name())?;
        out.push_str(&render::render_tree(controller.tree()));
        for abandoned in &report.abandoned {
            writeln!(out, "  not expanded: {abandoned}")?;
        }
        writeln!(out)?;
    }

    let form = form.borrow();
    for field in form.field_names() {
        out.push_str(&form.render_hidden_inputs(field));
    }
    Ok(out)
}
