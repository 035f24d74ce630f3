use std::path::PathBuf;

use crate::app::App;
use crate::artifact_io::{expand_home, mime_for_filename, read_file_bytes, save_script_artifact};
use crate::backend::{QaBackend, UploadDocument};

/// The two top-level workflow actions plus per-item script dispatch. The
/// trait seam exists so workflow tests can run against a scripted backend
/// double instead of a live HTTP client.
pub trait WorkflowService {
    /// Uploads the documents named in `input` (comma separated paths) and
    /// merges the successfully ingested filenames into the registry.
    fn build_knowledge_base(&self, app: &mut App, backend: &dyn QaBackend, input: &str);

    /// Replaces the test case collection from a natural-language query. All
    /// previous per-item script state is discarded before the request goes
    /// out.
    fn generate_test_cases(&self, app: &mut App, backend: &dyn QaBackend, query: &str);

    /// Issues the network call for the one pending script dispatch, if any,
    /// and resolves its state machine. Returns whether a dispatch happened.
    fn dispatch_pending_script(&self, app: &mut App, backend: &dyn QaBackend) -> bool;

    /// Writes the selected case's `Ready` script to the downloads directory
    /// as a commented artifact.
    fn save_selected_script(&self, app: &mut App, downloads_dir: &str);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultWorkflowService;

impl WorkflowService for DefaultWorkflowService {
    fn build_knowledge_base(&self, app: &mut App, backend: &dyn QaBackend, input: &str) {
        let paths = parse_path_list(input);
        if paths.is_empty() {
            app.push_warning("Please provide at least one file to upload.");
            return;
        }

        let mut documents = Vec::with_capacity(paths.len());
        for path in &paths {
            let filename = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string());
            match read_file_bytes(path) {
                Ok(bytes) => documents.push(UploadDocument {
                    mime: mime_for_filename(&filename).to_string(),
                    filename,
                    bytes,
                }),
                Err(err) => {
                    // Fail before any network traffic so the registry and the
                    // backend stay untouched by a half-readable batch.
                    app.push_error(format!("Could not read {}: {err}", path.display()));
                    return;
                }
            }
        }

        let session = app.session().clone();
        match backend.upload_documents(&session, documents) {
            Ok(outcomes) => {
                let succeeded: Vec<String> = outcomes
                    .iter()
                    .filter(|outcome| outcome.succeeded())
                    .map(|outcome| outcome.filename.clone())
                    .collect();
                if succeeded.is_empty() {
                    app.push_error("Failed to ingest any files.");
                } else {
                    app.push_success(format!(
                        "Successfully ingested {} file(s).",
                        succeeded.len()
                    ));
                    app.record_ingested(succeeded);
                }
                for outcome in outcomes.iter().filter(|outcome| !outcome.succeeded()) {
                    app.push_error(format!(
                        "Error processing {}: {}",
                        outcome.filename, outcome.message
                    ));
                }
            }
            Err(err) => app.push_error(format!("Upload failed: {err}")),
        }
    }

    fn generate_test_cases(&self, app: &mut App, backend: &dyn QaBackend, query: &str) {
        let query = query.trim();
        if query.is_empty() {
            app.push_warning("Please enter a description of the feature to test.");
            return;
        }

        // Explicit discard before the request: stale per-item script state
        // must never survive into the next collection.
        app.begin_new_collection();

        let session = app.session().clone();
        match backend.generate_test_cases(&session, query) {
            Ok(cases) => {
                let count = cases.len();
                app.install_test_cases(cases);
                app.push_success(format!("Generated {count} test case(s)."));
            }
            Err(err) => app.push_error(format!("Test case generation failed: {err}")),
        }
    }

    fn dispatch_pending_script(&self, app: &mut App, backend: &dyn QaBackend) -> bool {
        let Some(key) = app.take_pending_script() else {
            return false;
        };
        let Some(case) = app.case_for_key(&key).cloned() else {
            app.resolve_script(&key, Err("test case is no longer displayed".to_string()));
            return true;
        };

        let session = app.session().clone();
        let outcome = backend
            .generate_script(&session, &case)
            .map_err(|err| err.to_string());
        match &outcome {
            Ok(_) => app.push_success(format!("Script ready for {key}.")),
            Err(message) => app.push_error(format!("Script generation for {key} failed: {message}")),
        }
        app.resolve_script(&key, outcome);
        true
    }

    fn save_selected_script(&self, app: &mut App, downloads_dir: &str) {
        let Some(key) = app.selected_key() else {
            app.push_warning("No test case selected.");
            return;
        };
        let Some(script) = app.scripts().ready_script(&key).map(str::to_string) else {
            app.push_warning(format!("No generated script to save for {key}."));
            return;
        };
        let scenario = app
            .selected_case()
            .map(|case| case.test_scenario.clone())
            .unwrap_or_default();

        let saved = expand_home(downloads_dir)
            .and_then(|dir| save_script_artifact(&dir, &key, &scenario, &script));
        match saved {
            Ok(path) => app.push_success(format!("Saved script to {}.", path.display())),
            Err(err) => app.push_error(format!("Could not save script: {err}")),
        }
    }
}

fn parse_path_list(input: &str) -> Vec<PathBuf> {
    input
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(PathBuf::from)
        .collect()
}

#[cfg(test)]
#[path = "../tests/unit/services_tests.rs"]
mod tests;
