//! CLI interface for rubrica

mod form;
mod ui;

pub use form::{collect_inputs, run_form, FormInputs};
pub use ui::{
    display_banner, format_failure, format_score_table, read_block_from, read_text_block,
    render_batch_progress, render_batch_summary, render_failure, render_outcome, render_result,
    END_OF_BLOCK,
};

// Re-export core types
pub use rubrica_core::{Error, Result};
