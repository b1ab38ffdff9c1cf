//! Host-document fills and selections, as they arrive over the bridge.

use serde::{Deserialize, Serialize};

/// Reference to an image asset stored in the host document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ImageRef {
    pub id: String,
    pub width: u32,
    pub height: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mtype: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keep_aspect_ratio: Option<bool>,
}

/// One paint layer on a shape. Unknown host fields are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Fill {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill_opacity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill_image: Option<ImageRef>,
}

impl Fill {
    pub fn image(image: ImageRef) -> Self {
        Self {
            fill_image: Some(image),
            ..Default::default()
        }
    }
}

/// Fills of the selected shape.
///
/// The host reports `"mixed"` when a multi-selection has differing fills.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "FillsRepr", into = "FillsRepr")]
pub enum Fills {
    Uniform(Vec<Fill>),
    Mixed,
}

const MIXED_MARKER: &str = "mixed";

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum FillsRepr {
    List(Vec<Fill>),
    Marker(String),
}

impl TryFrom<FillsRepr> for Fills {
    type Error = String;

    fn try_from(repr: FillsRepr) -> Result<Self, Self::Error> {
        match repr {
            FillsRepr::List(fills) => Ok(Fills::Uniform(fills)),
            FillsRepr::Marker(marker) if marker == MIXED_MARKER => Ok(Fills::Mixed),
            FillsRepr::Marker(other) => Err(format!(
                "expected a fill list or \"{}\", got \"{}\"",
                MIXED_MARKER, other
            )),
        }
    }
}

impl From<Fills> for FillsRepr {
    fn from(fills: Fills) -> Self {
        match fills {
            Fills::Uniform(list) => FillsRepr::List(list),
            Fills::Mixed => FillsRepr::Marker(MIXED_MARKER.to_string()),
        }
    }
}

impl Default for Fills {
    fn default() -> Self {
        Fills::Uniform(Vec::new())
    }
}

impl Fills {
    /// True only for an empty list; `Mixed` counts as present.
    pub fn is_empty(&self) -> bool {
        matches!(self, Fills::Uniform(list) if list.is_empty())
    }

    /// Number of fills, `None` when mixed.
    pub fn len(&self) -> Option<usize> {
        match self {
            Fills::Uniform(list) => Some(list.len()),
            Fills::Mixed => None,
        }
    }

    /// The topmost (last) fill with its index.
    pub fn last(&self) -> Option<(usize, &Fill)> {
        match self {
            Fills::Uniform(list) => list.last().map(|fill| (list.len() - 1, fill)),
            Fills::Mixed => None,
        }
    }
}

/// The shape the host reports as selected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostSelection {
    pub id: String,
    pub name: String,
    pub fills: Fills,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fills_parse_list_and_mixed() {
        let list: Fills =
            serde_json::from_str(r##"[{"fillColor":"#ff0000","fillOpacity":1}]"##).unwrap();
        assert_eq!(list.len(), Some(1));

        let mixed: Fills = serde_json::from_str(r#""mixed""#).unwrap();
        assert_eq!(mixed, Fills::Mixed);
        assert_eq!(serde_json::to_string(&mixed).unwrap(), r#""mixed""#);
    }

    #[test]
    fn test_fills_reject_unknown_marker() {
        assert!(serde_json::from_str::<Fills>(r#""various""#).is_err());
    }

    #[test]
    fn test_fill_image_is_camel_case() {
        let fill = Fill::image(ImageRef {
            id: "img-1".into(),
            width: 10,
            height: 20,
            keep_aspect_ratio: Some(true),
            ..Default::default()
        });
        let json = serde_json::to_value(&fill).unwrap();
        assert_eq!(json["fillImage"]["keepAspectRatio"], true);
        assert!(json.get("fillColor").is_none());
    }

    #[test]
    fn test_last_returns_top_fill_index() {
        let fills = Fills::Uniform(vec![Fill::default(), Fill::default(), Fill::default()]);
        assert_eq!(fills.last().map(|(i, _)| i), Some(2));
        assert!(Fills::Mixed.last().is_none());
        assert!(Fills::default().last().is_none());
    }

    #[test]
    fn test_mixed_is_not_empty() {
        assert!(!Fills::Mixed.is_empty());
        assert!(Fills::default().is_empty());
    }

    #[test]
    fn test_selection_from_host_json() {
        let json = r#"{"id":"abc","name":"Rectangle","fills":[{"fillImage":{"id":"i","width":4,"height":4}}]}"#;
        let selection: HostSelection = serde_json::from_str(json).unwrap();
        assert_eq!(selection.id, "abc");
        assert_eq!(selection.fills.len(), Some(1));
    }
}
