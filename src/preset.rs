use std::fs;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use roxmltree::{Document, Node};

use crate::panel::{Folder, PanelValues};

/// One `<folder><key>value</key></folder>` entry of a preset file.
#[derive(Debug, Clone, PartialEq)]
pub struct PresetEntry {
    pub folder: Folder,
    pub key: String,
    pub value: String,
}

/// Panel values loaded from an XML preset:
///
/// ```xml
/// <preset>
///   <effectMode>Black Hole</effectMode>
///   <blackHole>
///     <innerColor>#ff0000</innerColor>
///     <speed>2</speed>
///   </blackHole>
/// </preset>
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Preset {
    pub entries: Vec<PresetEntry>,
}

impl Preset {
    pub fn from_xml(xml: &str) -> Result<Self> {
        let document = Document::parse(xml).context("invalid preset XML")?;
        let root = document.root_element();
        if !root.has_tag_name("preset") {
            return Err(anyhow!(
                "expected <preset> root, found <{}>",
                root.tag_name().name()
            ));
        }

        let mut entries = Vec::new();
        for node in root.children().filter(Node::is_element) {
            let tag = node.tag_name().name();
            if tag == "effectMode" {
                entries.push(PresetEntry {
                    folder: Folder::Orb,
                    key: tag.to_string(),
                    value: required_text(&node)?,
                });
                continue;
            }
            let folder: Folder = tag
                .parse()
                .with_context(|| format!("unexpected <{tag}> in preset"))?;
            for control in node.children().filter(Node::is_element) {
                entries.push(PresetEntry {
                    folder,
                    key: control.tag_name().name().to_string(),
                    value: required_text(&control)?,
                });
            }
        }

        Ok(Self { entries })
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let xml = fs::read_to_string(path)
            .with_context(|| format!("failed to read preset {}", path.display()))?;
        Self::from_xml(&xml).with_context(|| format!("failed to parse preset {}", path.display()))
    }

    /// Applies every entry in document order. Stops at the first rejected
    /// value; earlier entries stay applied.
    pub fn apply(&self, values: &mut PanelValues) -> Result<()> {
        for entry in &self.entries {
            values
                .set(entry.folder, &entry.key, &entry.value)
                .with_context(|| format!("invalid preset value {}.{}", entry.folder, entry.key))?;
        }
        Ok(())
    }
}

fn required_text(node: &Node<'_, '_>) -> Result<String> {
    node.text()
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(|text| text.to_string())
        .ok_or_else(|| anyhow!("<{}> has no value", node.tag_name().name()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::EffectMode;

    const SAMPLE: &str = r#"
    <preset>
        <effectMode>Black Hole</effectMode>
        <blackHole>
            <innerColor>#ff0000</innerColor>
            <outerColor>#0000ff</outerColor>
            <speed>2</speed>
        </blackHole>
        <slime>
            <distortion>0.8</distortion>
        </slime>
    </preset>
    "#;

    #[test]
    fn parse_preset_collects_entries() {
        let preset = Preset::from_xml(SAMPLE).unwrap();
        assert_eq!(preset.entries.len(), 5);
        assert_eq!(preset.entries[0].folder, Folder::Orb);
        assert_eq!(preset.entries[3].key, "speed");
        assert_eq!(preset.entries[4].folder, Folder::Slime);
    }

    #[test]
    fn apply_updates_panel_values() {
        let mut values = PanelValues::default();
        Preset::from_xml(SAMPLE).unwrap().apply(&mut values).unwrap();
        assert_eq!(values.effect_mode, EffectMode::BlackHole);
        assert_eq!(values.black_hole.inner_color.to_hex(), "#ff0000");
        assert_eq!(values.black_hole.speed, 2.0);
        assert_eq!(values.slime.distortion, 0.8);
    }

    #[test]
    fn wrong_root_is_an_error() {
        assert!(Preset::from_xml("<scene/>").is_err());
    }

    #[test]
    fn unknown_folder_and_empty_values_are_errors() {
        assert!(Preset::from_xml("<preset><tornado/></preset>").is_err());
        assert!(Preset::from_xml("<preset><slime><speed> </speed></slime></preset>").is_err());
    }

    #[test]
    fn bad_values_fail_on_apply() {
        let preset = Preset::from_xml("<preset><slime><speed>fast</speed></slime></preset>").unwrap();
        let mut values = PanelValues::default();
        let err = preset.apply(&mut values).unwrap_err();
        assert!(format!("{err:#}").contains("slime.speed"));
    }
}
