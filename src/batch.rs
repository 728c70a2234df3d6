//! Headless replay of user events against an activated document

use tracing::{info, warn};

use crate::driver::{DriverEvent, Enhancer};
use crate::error::{EnhanceError, Result};

/// Events to replay. Indices are 0-based.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchPlan {
    /// Table the events go to; every table when unset
    pub table: Option<usize>,
    pub clicks: Vec<usize>,
    pub filter: Option<String>,
}

impl BatchPlan {
    pub fn is_empty(&self) -> bool {
        self.clicks.is_empty() && self.filter.is_none()
    }
}

/// Replay the header clicks of `plan` in order, then its filter text.
/// Returns every driver event produced, in order.
pub fn replay(enhancer: &mut Enhancer, plan: &BatchPlan) -> Result<Vec<DriverEvent>> {
    let targets: Vec<usize> = match plan.table {
        Some(index) if index >= enhancer.len() => return Err(EnhanceError::NoSuchTable(index + 1)),
        Some(index) => vec![index],
        None => (0..enhancer.len()).collect(),
    };

    let mut events = Vec::new();
    for &index in &targets {
        for &column in &plan.clicks {
            let event = enhancer.click_header(index, column);
            if event == DriverEvent::Ignored {
                warn!(table = index + 1, column = column + 1, "no sortable header at this column");
            }
            events.push(event);
        }
        if let Some(text) = &plan.filter {
            events.push(enhancer.input_filter(index, text));
        }
    }

    info!(tables = targets.len(), events = events.len(), "replayed events");
    Ok(events)
}
