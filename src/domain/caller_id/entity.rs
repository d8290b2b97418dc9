//! Caller-id entity

use crate::domain::shared::value_objects::CallerIdId;
use serde::{Deserialize, Serialize};

/// Number presented to the called party
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallerId {
    pub id: CallerIdId,
    pub number: String,
    pub is_active: bool,
}

impl CallerId {
    pub fn new(number: impl Into<String>) -> Self {
        Self {
            id: CallerIdId::new(),
            number: number.into(),
            is_active: true,
        }
    }
}
