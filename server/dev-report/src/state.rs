//! Shared application state.

use crate::config::ReportArgs;

#[derive(Debug, Clone)]
pub struct AppState {
  /// Defaults for every report; a slash command may pick another repository.
  pub args: ReportArgs,
}
