//! Task-type parsing and naming conventions.

/// Task type used when a record names none, and the fallback when the
/// requested type does not exist on the server.
pub const DEFAULT_TASK_TYPE: &str = "Compositing";

/// Name of the review task created automatically for every new shot.
pub const CONFORM_TASK_NAME: &str = "conform";

/// Spellings of the conform task type, tried in order.
pub const CONFORM_TYPE_CANDIDATES: &[&str] = &["Conform", "conform", "CONFORM", "Conforming"];

/// Description stamped on auto-created conform tasks.
pub const CONFORM_TASK_DESCRIPTION: &str = "Auto-created conform task from editorial import";

/// Task types offered to the artist as suggestions.
pub const KNOWN_TASK_TYPES: &[&str] = &[
    "Compositing",
    "Rotoscoping",
    "Tracking",
    "Texture",
    "FX",
    "Lighting",
    "Animation",
    "Modeling",
    "Rigging",
    "Lookdev",
    "Layout",
    "Previz",
    "Rendering",
    "Matte Painting",
    "Conform",
    "Color",
    "Editing",
];

/// Shorthand used on editorial tables, mapped to tracker type names.
const TYPE_ALIASES: &[(&str, &str)] = &[
    ("roto", "Rotoscoping"),
    ("rotoscoping", "Rotoscoping"),
    ("comp", "Compositing"),
    ("compositing", "Compositing"),
    ("track", "Tracking"),
    ("tracking", "Tracking"),
    ("matchmove", "Tracking"),
    ("paint", "Texture"),
    ("cleanup", "Texture"),
    ("prep", "Texture"),
    ("texture", "Texture"),
    ("fx", "FX"),
    ("lighting", "Lighting"),
    ("animation", "Animation"),
];

/// Split a comma-separated list of task types. Tokens are trimmed and
/// empty tokens dropped, so `"Compositing,,"` yields one entry.
pub fn parse_task_types(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Map editorial shorthand onto the tracker type name. Unknown names are
/// returned trimmed but otherwise unchanged.
pub fn canonical_type_name(name: &str) -> String {
    let trimmed = name.trim();
    let lower = trimmed.to_lowercase();
    TYPE_ALIASES
        .iter()
        .find(|(alias, _)| *alias == lower)
        .map(|(_, canonical)| (*canonical).to_string())
        .unwrap_or_else(|| trimmed.to_string())
}

/// Task entity name for a type: lowercase, spaces replaced by underscores.
///
/// ```
/// use shotbridge_core::task_type::task_name_for_type;
///
/// assert_eq!(task_name_for_type("Matte Painting"), "matte_painting");
/// ```
pub fn task_name_for_type(task_type: &str) -> String {
    task_type.trim().to_lowercase().replace(' ', "_")
}

/// Known task types starting with `prefix` (case-insensitive).
pub fn suggest_task_types(prefix: &str) -> Vec<&'static str> {
    let prefix = prefix.trim().to_lowercase();
    KNOWN_TASK_TYPES
        .iter()
        .copied()
        .filter(|t| t.to_lowercase().starts_with(&prefix))
        .collect()
}
