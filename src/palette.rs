//! Per-class display colors.
//!
//! Every class label maps to a color. Explicit user overrides always win;
//! otherwise a color is generated from a stable hash of the label and cached.
//! Generated colors never depend on insertion order or on other labels, so
//! changing one class never shifts another.
//!
//! The palette is session state shared by every image. [`global`] exposes the
//! process-wide instance; a standalone [`Palette`] can be built for tests.

use std::collections::{BTreeMap, HashMap};
use std::sync::OnceLock;

use parking_lot::Mutex;

use crate::color_utils::{hsv_to_rgb, rgb_to_u8, stable_hash};

/// 8-bit RGB color.
pub type Rgb = [u8; 3];

/// Lower bound of the saturation and value band for generated colors.
pub const BRIGHT_BAND_MIN: f32 = 0.86;

/// Upper bound of the saturation and value band for generated colors.
pub const BRIGHT_BAND_MAX: f32 = 1.0;

/// Where a palette entry came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntrySource {
    /// Derived from the label hash.
    Generated,
    /// Set explicitly by the user.
    Explicit,
}

/// A resolved color for one class.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PaletteEntry {
    /// Hue in degrees (0-360). Meaningless for explicit entries.
    pub hue: f32,
    /// Saturation (0.0-1.0).
    pub saturation: f32,
    /// Value/brightness (0.0-1.0).
    pub value: f32,
    pub rgb: Rgb,
    pub source: EntrySource,
}

impl PaletteEntry {
    /// Derive the generated entry for a label.
    ///
    /// Hue, saturation and value come from independent bit ranges of the label
    /// hash; saturation and value stay inside the bright band.
    pub fn generate(label: &str) -> Self {
        let hash = stable_hash(label);
        let hue = (hash % 3600) as f32 / 10.0;
        let band = |bits: u64| {
            let unit = (bits & 0xffff) as f32 / 65535.0;
            BRIGHT_BAND_MIN + unit * (BRIGHT_BAND_MAX - BRIGHT_BAND_MIN)
        };
        let saturation = band(hash >> 16);
        let value = band(hash >> 32);
        Self {
            hue,
            saturation,
            value,
            rgb: rgb_to_u8(hsv_to_rgb(hue, saturation, value)),
            source: EntrySource::Generated,
        }
    }

    fn explicit(rgb: Rgb) -> Self {
        Self {
            hue: 0.0,
            saturation: 0.0,
            value: 0.0,
            rgb,
            source: EntrySource::Explicit,
        }
    }
}

/// Class label to color mapping.
#[derive(Debug, Clone, Default)]
pub struct Palette {
    /// Colors derived from label hashes, filled lazily.
    generated: HashMap<String, PaletteEntry>,
    /// User overrides; these take precedence.
    explicit: HashMap<String, Rgb>,
}

impl Palette {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a palette seeded with explicit overrides (e.g. from the config file).
    pub fn with_overrides<'a>(overrides: impl IntoIterator<Item = (&'a String, &'a Rgb)>) -> Self {
        let mut palette = Self::new();
        for (label, rgb) in overrides {
            palette.set_override(label, *rgb);
        }
        palette
    }

    /// Color for a class label.
    pub fn color_for(&mut self, label: &str) -> Rgb {
        self.entry(label).rgb
    }

    /// Full palette entry for a class label, generating and caching it on first use.
    pub fn entry(&mut self, label: &str) -> PaletteEntry {
        if let Some(rgb) = self.explicit.get(label) {
            return PaletteEntry::explicit(*rgb);
        }
        *self
            .generated
            .entry(label.to_string())
            .or_insert_with(|| {
                log::debug!("Generated palette color for class '{}'", label);
                PaletteEntry::generate(label)
            })
    }

    /// Install or replace an explicit color for a class.
    pub fn set_override(&mut self, label: &str, rgb: Rgb) {
        log::debug!("Palette override for '{}': {:?}", label, rgb);
        self.explicit.insert(label.to_string(), rgb);
    }

    /// Drop the explicit color for a class so the generated one applies again.
    /// Returns the removed override, if there was one.
    pub fn reset_to_generated(&mut self, label: &str) -> Option<Rgb> {
        self.explicit.remove(label)
    }

    /// Whether a class currently has an explicit override.
    pub fn has_override(&self, label: &str) -> bool {
        self.explicit.contains_key(label)
    }

    /// Explicit overrides in label order, for persisting in the config file.
    pub fn overrides(&self) -> BTreeMap<String, Rgb> {
        self.explicit
            .iter()
            .map(|(label, rgb)| (label.clone(), *rgb))
            .collect()
    }

    /// Forget every generated and explicit entry (full application reset).
    pub fn reset_all(&mut self) {
        self.generated.clear();
        self.explicit.clear();
        log::info!("Palette reset");
    }
}

/// The process-wide palette shared by all images in the session.
pub fn global() -> &'static Mutex<Palette> {
    static PALETTE: OnceLock<Mutex<Palette>> = OnceLock::new();
    PALETTE.get_or_init(|| Mutex::new(Palette::new()))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_is_deterministic() {
        let mut palette = Palette::new();
        let first = palette.color_for("cat");
        assert_eq!(palette.color_for("cat"), first);

        // A fresh palette (new process) yields the same color
        let mut other = Palette::new();
        assert_eq!(other.color_for("cat"), first);
        assert_eq!(PaletteEntry::generate("cat").rgb, first);
    }

    #[test]
    fn test_generated_entries_stay_in_bright_band() {
        for label in ["cat", "dog", "person", "car", "traffic light", "", "日本"] {
            let entry = PaletteEntry::generate(label);
            assert!((0.0..360.0).contains(&entry.hue));
            assert!((BRIGHT_BAND_MIN..=BRIGHT_BAND_MAX).contains(&entry.saturation));
            assert!((BRIGHT_BAND_MIN..=BRIGHT_BAND_MAX).contains(&entry.value));
            assert_eq!(entry.source, EntrySource::Generated);
        }
    }

    #[test]
    fn test_distinct_labels_get_distinct_colors() {
        let mut palette = Palette::new();
        assert_ne!(palette.color_for("cat"), palette.color_for("dog"));
    }

    #[test]
    fn test_override_takes_precedence() {
        let mut palette = Palette::new();
        let generated = palette.color_for("cat");
        palette.set_override("cat", [1, 2, 3]);
        assert_eq!(palette.color_for("cat"), [1, 2, 3]);
        assert_eq!(palette.entry("cat").source, EntrySource::Explicit);

        assert_eq!(palette.reset_to_generated("cat"), Some([1, 2, 3]));
        assert_eq!(palette.color_for("cat"), generated);
        assert_eq!(palette.reset_to_generated("cat"), None);
    }

    #[test]
    fn test_override_survives_other_classes() {
        let mut palette = Palette::new();
        palette.set_override("cat", [10, 20, 30]);
        palette.color_for("dog");
        palette.reset_to_generated("dog");
        assert_eq!(palette.color_for("cat"), [10, 20, 30]);
    }

    #[test]
    fn test_overrides_roundtrip_and_reset_all() {
        let mut palette = Palette::new();
        palette.set_override("b", [0, 0, 255]);
        palette.set_override("a", [255, 0, 0]);

        let overrides = palette.overrides();
        assert_eq!(overrides.keys().collect::<Vec<_>>(), vec!["a", "b"]);

        let mut restored = Palette::with_overrides(&overrides);
        assert_eq!(restored.color_for("a"), [255, 0, 0]);

        restored.reset_all();
        assert!(!restored.has_override("a"));
        assert_eq!(restored.color_for("a"), PaletteEntry::generate("a").rgb);
    }

    #[test]
    fn test_global_palette_is_shared() {
        let label = "palette-global-test-label";
        global().lock().set_override(label, [7, 8, 9]);
        assert_eq!(global().lock().color_for(label), [7, 8, 9]);
        global().lock().reset_to_generated(label);
    }
}
