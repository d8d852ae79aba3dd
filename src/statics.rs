// Central place for field names and schema tables shared by the engine and
// the store. Keep these out of the logic modules to reduce duplication and
// make schema tweaks safer.

// Conventional record fields.
pub const FIELD_ID: &str = "id";
pub const FIELD_NAME: &str = "name";
pub const FIELD_TYPE: &str = "type";
pub const FIELD_TAGS: &str = "tags";
pub const FIELD_NOTES: &str = "notes";
pub const FIELD_DESCRIPTION: &str = "description";

// Monster fields.
pub const FIELD_CHALLENGE_RATING: &str = "challenge_rating";
pub const FIELD_SIZE: &str = "size";
pub const FIELD_ARMOR_CLASS: &str = "armor_class";
pub const FIELD_HIT_POINTS: &str = "hit_points";
pub const FIELD_ALIGNMENT: &str = "alignment";

// Item fields.
pub const FIELD_PRICE: &str = "price";
pub const FIELD_WEIGHT: &str = "weight";
pub const FIELD_STACK: &str = "stack";
pub const FIELD_AC: &str = "ac";
pub const FIELD_DAMAGE: &str = "damage";
pub const FIELD_HEAL: &str = "heal";

// Free-text search scans these scalar fields...
pub const SEARCH_TEXT_FIELDS: &[&str] = &[
    FIELD_NAME,
    FIELD_TYPE,
    FIELD_ALIGNMENT,
    FIELD_DESCRIPTION,
];
// ...and every entry of these list fields.
pub const SEARCH_LIST_FIELDS: &[&str] = &[FIELD_TAGS, FIELD_NOTES];

// Column sort is limited to the fields the editors exposed as columns.
pub const SORTABLE_FIELDS: &[&str] = &[
    FIELD_NAME,
    FIELD_CHALLENGE_RATING,
    FIELD_TYPE,
    FIELD_SIZE,
    FIELD_ARMOR_CLASS,
    FIELD_HIT_POINTS,
    FIELD_ALIGNMENT,
    FIELD_PRICE,
    FIELD_WEIGHT,
    FIELD_STACK,
];

// Fields that sort and bulk-edit numerically, split by integer vs float.
pub const FLOAT_FIELDS: &[&str] = &[FIELD_CHALLENGE_RATING, FIELD_WEIGHT];
pub const INTEGER_FIELDS: &[&str] = &[
    FIELD_ID,
    FIELD_ARMOR_CLASS,
    FIELD_HIT_POINTS,
    FIELD_PRICE,
    FIELD_STACK,
];

// Fields where "none"/"null" input clears the value instead of storing text.
pub const NULLABLE_FIELDS: &[&str] = &[FIELD_AC, FIELD_DAMAGE, FIELD_HEAL];

// List-valued fields; `tags` additionally merges on bulk edit.
pub const LIST_FIELDS: &[&str] = &[FIELD_TAGS, FIELD_NOTES];

// Core schema fields that bulk remove-field refuses to touch.
pub const CORE_FIELDS: &[&str] = &[
    FIELD_ID,
    FIELD_NAME,
    FIELD_TYPE,
    FIELD_TAGS,
    FIELD_NOTES,
    FIELD_DESCRIPTION,
    FIELD_CHALLENGE_RATING,
    FIELD_SIZE,
    FIELD_ARMOR_CLASS,
    FIELD_HIT_POINTS,
    FIELD_ALIGNMENT,
    FIELD_PRICE,
    FIELD_WEIGHT,
    FIELD_STACK,
    FIELD_AC,
    FIELD_DAMAGE,
    FIELD_HEAL,
];

// On-disk bits.
pub const JSON_EXT: &str = "json";
