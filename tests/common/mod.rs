//! Common test utilities

use std::path::Path;

/// Manifest in the `races` format with two races
pub const RACES_JSON: &str = r#"{
  "races": [
    {
      "id": "r1",
      "title": "日本ダービー",
      "datetime": "2024-05-26T15:40:00+09:00",
      "track": "東京",
      "distance": "芝2400m",
      "attachments": [
        { "type": "pdf", "label": "出馬表", "src": "/pdf/r1.pdf", "filename": "r1.pdf" },
        { "type": "image", "label": "パドック", "src": "/img/r1.png" }
      ]
    },
    {
      "id": "r2",
      "title": "オークス",
      "attachments": [
        { "type": "link", "label": "netkeiba", "src": "https://race.netkeiba.com/race/shutuba.html?race_id=r2" }
      ]
    }
  ]
}"#;

/// Manifest in the legacy predictions format
pub const LEGACY_JSON: &str = r#"{
  "202405021211": [
    {
      "horse_id": 2019105219,
      "horse_name": "ドウデュース",
      "draw": 1,
      "win_prob": 0.234,
      "links": { "race": "https://race.netkeiba.com/race/shutuba.html?race_id=202405021211" }
    },
    { "horse_id": "2019104308", "horse_name": "イクイノックス", "draw": 3, "win_prob": 0.198 }
  ]
}"#;

/// Write `body` to `<root>/<relative>`, creating parents
#[allow(dead_code)]
pub fn write_public_file(root: &Path, relative: &str, body: &str) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, body).unwrap();
}
