use serde::{Deserialize, Serialize};

/// A photo or video as the catalog reports it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    pub id: String,
    /// Filename at upload time, without directories
    pub original_file_name: String,
    /// Creation time currently stored by the catalog
    pub file_created_at: String,
}

impl Asset {
    pub fn new(id: &str, original_file_name: &str, file_created_at: &str) -> Self {
        Self {
            id: id.to_string(),
            original_file_name: original_file_name.to_string(),
            file_created_at: file_created_at.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_asset_wire_names() {
        let json = r#"{
            "id": "d70e3a48-7dbb-474f-821d-f9e95d1106d6",
            "originalFileName": "IMG_20190130_172450.jpg",
            "fileCreatedAt": "2023-08-01T10:00:00.000Z",
            "isFavorite": false
        }"#;
        let asset: Asset = serde_json::from_str(json).unwrap();
        assert_eq!(asset.id, "d70e3a48-7dbb-474f-821d-f9e95d1106d6");
        assert_eq!(asset.original_file_name, "IMG_20190130_172450.jpg");
        assert_eq!(asset.file_created_at, "2023-08-01T10:00:00.000Z");
    }
}
