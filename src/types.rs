use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{MenuError, Result};
use crate::layout::{self, SECTIONS};

/// One product line destined for a fixed row of the board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuEntry {
    pub product: String,
    pub price: String,
    pub y: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuSection {
    pub name: String,
    pub entries: Vec<MenuEntry>,
}

/// Everything the renderer draws: a date and the filled entries per section.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MenuRequest {
    pub date: String,
    pub sections: Vec<MenuSection>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SlotInput {
    #[serde(default)]
    pub product: String,
    #[serde(default)]
    pub price: String,
}

/// Raw form submission, slot `i` of a section maps to row `i` of its layout.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MenuForm {
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub sections: BTreeMap<String, Vec<SlotInput>>,
}

impl MenuForm {
    /// A form with every section and every slot present but empty.
    pub fn blank() -> Self {
        let sections = SECTIONS
            .iter()
            .map(|s| (s.name.to_string(), vec![SlotInput::default(); s.rows.len()]))
            .collect();
        Self {
            date: String::new(),
            sections,
        }
    }

    /// Resolves slots to rows and drops slots without a product.
    pub fn to_request(&self) -> Result<MenuRequest> {
        for (name, slots) in &self.sections {
            let section =
                layout::section(name).ok_or_else(|| MenuError::UnknownSection(name.clone()))?;
            if slots.len() > section.rows.len() {
                return Err(MenuError::TooManySlots {
                    section: name.clone(),
                    given: slots.len(),
                    rows: section.rows.len(),
                });
            }
        }

        let sections = SECTIONS
            .iter()
            .filter_map(|layout| {
                let slots = self.sections.get(layout.name)?;
                let entries = slots
                    .iter()
                    .zip(layout.rows)
                    .filter(|(slot, _)| !slot.product.is_empty())
                    .map(|(slot, &y)| MenuEntry {
                        product: slot.product.clone(),
                        price: slot.price.clone(),
                        y,
                    })
                    .collect();
                Some(MenuSection {
                    name: layout.name.to_string(),
                    entries,
                })
            })
            .collect();

        Ok(MenuRequest {
            date: self.date.clone(),
            sections,
        })
    }
}

/// A saved board in the history directory.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HistoryRecord {
    pub file_name: String,
    pub path: String,
    /// Modification time in unix seconds.
    pub modified_at: i64,
    /// Generation timestamp parsed from the file name, `YYYY-MM-DD_HH-MM-SS`.
    pub generated_at: Option<String>,
    pub label: String,
}
