//! Write TypeScript declarations for every type that crosses the API.
//!
//! Usage: `cargo run --bin generate-types [output-path]`

use std::{fs, path::PathBuf};

use db::models::{
    profile::{Profile, UpdateProfile},
    training_session::{GiType, SessionWithProfile, TrainingSession},
};
use server::routes::auth::MagicLinkRequest;
use services::services::{
    stats::LogStats,
    training_log::{MyLog, NewSessionForm, SessionDetail},
};
use ts_rs::TS;
use utils::response::ApiResponse;

const DEFAULT_OUTPUT: &str = "shared/types.ts";

fn declarations() -> Vec<String> {
    vec![
        ApiResponse::<()>::decl(),
        GiType::decl(),
        Profile::decl(),
        UpdateProfile::decl(),
        TrainingSession::decl(),
        SessionWithProfile::decl(),
        NewSessionForm::decl(),
        LogStats::decl(),
        MyLog::decl(),
        SessionDetail::decl(),
        MagicLinkRequest::decl(),
    ]
}

fn main() -> anyhow::Result<()> {
    let output = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT));

    let mut contents = String::from(
        "// This file was generated by `cargo run --bin generate-types`. Do not edit.\n\n",
    );
    for decl in declarations() {
        contents.push_str("export ");
        contents.push_str(&decl);
        contents.push_str("\n\n");
    }

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(&output, contents)?;
    println!("Wrote TypeScript types to {}", output.display());
    Ok(())
}
