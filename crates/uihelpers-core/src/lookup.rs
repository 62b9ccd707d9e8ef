//! Identifier lookup across element categories.
//!
//! Some screens reuse an identifier on elements of different types (a button
//! and its caption, say). A [`LookupTable`] queries the categories in a fixed
//! priority order and returns the first category that holds the identifier.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::driver::AutomationDriver;
use crate::element::{ElementRef, ElementType, UIElement};
use crate::error::HelperError;

/// Ordered list of element categories to try.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LookupTable(Vec<ElementType>);

impl LookupTable {
    pub fn new(priority: Vec<ElementType>) -> Self {
        Self(priority)
    }

    pub fn priority(&self) -> &[ElementType] {
        &self.0
    }

    /// Finds `identifier`, trying each category in priority order.
    pub async fn find(
        &self,
        driver: &dyn AutomationDriver,
        identifier: &str,
    ) -> Result<(ElementType, UIElement), HelperError> {
        for &category in &self.0 {
            let query = ElementRef::identifier(identifier).of_type(category);
            if let Some(element) = driver.resolve(&query).await? {
                debug!(identifier, %category, "lookup hit");
                return Ok((category, element));
            }
        }
        Err(HelperError::Lookup {
            identifier: identifier.to_string(),
            attempted: self.0.clone(),
        })
    }
}

impl Default for LookupTable {
    /// Interactive controls first, then containers, then decoration.
    fn default() -> Self {
        use ElementType::*;
        Self(vec![
            Button,
            TextField,
            SecureTextField,
            SearchField,
            Switch,
            Link,
            Cell,
            Image,
            StaticText,
            PickerWheel,
            Picker,
            CollectionView,
            Table,
            ScrollView,
            Toolbar,
            NavigationBar,
            Other,
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_table_puts_controls_before_text() {
        let table = LookupTable::default();
        let pos = |t| table.priority().iter().position(|&p| p == t).unwrap();
        assert!(pos(ElementType::Button) < pos(ElementType::StaticText));
        assert!(pos(ElementType::Cell) < pos(ElementType::Other));
    }

    #[test]
    fn test_table_serializes_as_plain_list() {
        let table = LookupTable::new(vec![ElementType::Image, ElementType::Button]);
        assert_eq!(serde_json::to_string(&table).unwrap(), r#"["Image","Button"]"#);
    }
}
