//! Table schema definitions for the statistics star schema

use super::types::*;

const NAME_COLUMNS: &[Column] = &[Column::required("name", ColumnType::Text)];
const NAME_INDEX: &[Index] = &[Index::on(&["name"])];

/// A dimension identified by nothing but its name
const fn named(name: &'static str, primary_key: &'static str) -> TableSchema {
    TableSchema {
        name,
        kind: TableKind::Dimension,
        primary_key,
        columns: NAME_COLUMNS,
        foreign_keys: &[],
        indexes: NAME_INDEX,
    }
}

const SUBSET_COLUMNS: &[Column] = &[Column::required("attachment_id", ColumnType::Integer)];
const SUBSET_FOREIGN_KEYS: &[ForeignKey] = &[ForeignKey::new("attachment_id", "attachment")];
const SUBSET_INDEX: &[Index] = &[Index::unique(&["attachment_id"])];

/// Attachments observed in one weapon slot
const fn attachment_subset(name: &'static str, primary_key: &'static str) -> TableSchema {
    TableSchema {
        name,
        kind: TableKind::Dimension,
        primary_key,
        columns: SUBSET_COLUMNS,
        foreign_keys: SUBSET_FOREIGN_KEYS,
        indexes: SUBSET_INDEX,
    }
}

// =============================================================================
// Name dimensions (no FK dependencies)
// =============================================================================

pub static PLATFORM: TableSchema = named("platform", "platform_id");
pub static GAMEMODE: TableSchema = named("gamemode", "gamemode_id");
pub static MAP: TableSchema = named("map", "map_id");
pub static ROLE: TableSchema = named("role", "role_id");
pub static CTU: TableSchema = named("ctu", "ctu_id");
pub static SKILLRANK: TableSchema = named("skillrank", "skillrank_id");
pub static WEAPONTYPE: TableSchema = named("weapontype", "weapontype_id");
pub static ENDROUNDREASON: TableSchema = named("endroundreason", "endroundreason_id");
pub static GADGET: TableSchema = named("gadget", "gadget_id");
pub static ATTACHMENT: TableSchema = named("attachment", "attachment_id");

// =============================================================================
// Composite dimensions
// =============================================================================

pub static ATTACHMENT_SIGHT: TableSchema =
    attachment_subset("attachment_sight", "attachment_sight_id");
pub static ATTACHMENT_GRIP: TableSchema =
    attachment_subset("attachment_grip", "attachment_grip_id");
pub static ATTACHMENT_UNDERBARREL: TableSchema =
    attachment_subset("attachment_underbarrel", "attachment_underbarrel_id");
pub static ATTACHMENT_BARREL: TableSchema =
    attachment_subset("attachment_barrel", "attachment_barrel_id");

pub static OBJECTIVE: TableSchema = TableSchema {
    name: "objective",
    kind: TableKind::Dimension,
    primary_key: "objective_id",
    columns: &[
        Column::required("name", ColumnType::Text),
        Column::required("map_id", ColumnType::Integer),
        Column::required("gamemode_id", ColumnType::Integer),
    ],
    foreign_keys: &[
        ForeignKey::new("map_id", "map"),
        ForeignKey::new("gamemode_id", "gamemode"),
    ],
    indexes: &[Index::on(&["name"])],
};

pub static OPERATOR: TableSchema = TableSchema {
    name: "operator",
    kind: TableKind::Dimension,
    primary_key: "operator_id",
    columns: &[
        Column::required("name", ColumnType::Text),
        Column::required("ctu_id", ColumnType::Integer),
        Column::required("role_id", ColumnType::Integer),
    ],
    foreign_keys: &[
        ForeignKey::new("ctu_id", "ctu"),
        ForeignKey::new("role_id", "role"),
    ],
    indexes: &[Index::on(&["name"])],
};

pub static WEAPON: TableSchema = TableSchema {
    name: "weapon",
    kind: TableKind::Dimension,
    primary_key: "weapon_id",
    columns: &[
        Column::required("name", ColumnType::Text),
        Column::required("weapontype_id", ColumnType::Integer),
    ],
    foreign_keys: &[ForeignKey::new("weapontype_id", "weapontype")],
    indexes: &[Index::on(&["name"])],
};

pub static MATCH: TableSchema = TableSchema {
    name: "match",
    kind: TableKind::Dimension,
    primary_key: "match_id",
    columns: &[
        Column::required("external_id", ColumnType::Text),
        Column::new("date", ColumnType::Text),
        Column::new("map_id", ColumnType::Integer),
        Column::new("gamemode_id", ColumnType::Integer),
    ],
    foreign_keys: &[
        ForeignKey::new("map_id", "map"),
        ForeignKey::new("gamemode_id", "gamemode"),
    ],
    indexes: &[Index::unique(&["external_id"])],
};

pub static ROUND: TableSchema = TableSchema {
    name: "round",
    kind: TableKind::Dimension,
    primary_key: "round_id",
    columns: &[
        Column::required("match_id", ColumnType::Integer),
        Column::required("round_num", ColumnType::Integer),
        Column::new("objective_id", ColumnType::Integer),
        Column::new("winrole_id", ColumnType::Integer),
        Column::new("endroundreason_id", ColumnType::Integer),
        Column::new("duration", ColumnType::Integer),
    ],
    foreign_keys: &[
        ForeignKey::new("match_id", "match"),
        ForeignKey::new("objective_id", "objective"),
        ForeignKey::new("winrole_id", "role"),
        ForeignKey::new("endroundreason_id", "endroundreason"),
    ],
    indexes: &[Index::unique(&["match_id", "round_num"])],
};

// =============================================================================
// Fact tables
// =============================================================================

pub static STAT_OBJECTIVE: TableSchema = TableSchema {
    name: "stat_objective",
    kind: TableKind::Fact,
    primary_key: "stat_id",
    columns: &[
        Column::new("platform_id", ColumnType::Integer),
        Column::new("date", ColumnType::Text),
        Column::new("objective_id", ColumnType::Integer),
        Column::new("operator_id", ColumnType::Integer),
        Column::new("skillrank_id", ColumnType::Integer),
        Column::new("wins", ColumnType::Integer),
        Column::new("kills", ColumnType::Integer),
        Column::new("deaths", ColumnType::Integer),
        Column::new("picks", ColumnType::Integer),
    ],
    foreign_keys: &[
        ForeignKey::new("platform_id", "platform"),
        ForeignKey::new("objective_id", "objective"),
        ForeignKey::new("operator_id", "operator"),
        ForeignKey::new("skillrank_id", "skillrank"),
    ],
    indexes: &[],
};

pub static STAT_LOADOUT: TableSchema = TableSchema {
    name: "stat_loadout",
    kind: TableKind::Fact,
    primary_key: "stat_id",
    columns: &[
        Column::new("platform_id", ColumnType::Integer),
        Column::new("date", ColumnType::Text),
        Column::new("operator_id", ColumnType::Integer),
        Column::new("primaryweapon_id", ColumnType::Integer),
        Column::new("primarysight_id", ColumnType::Integer),
        Column::new("primarygrip_id", ColumnType::Integer),
        Column::new("primaryunderbarrel_id", ColumnType::Integer),
        Column::new("primarybarrel_id", ColumnType::Integer),
        Column::new("secondaryweapon_id", ColumnType::Integer),
        Column::new("secondarysight_id", ColumnType::Integer),
        Column::new("secondarygrip_id", ColumnType::Integer),
        Column::new("secondaryunderbarrel_id", ColumnType::Integer),
        Column::new("secondarybarrel_id", ColumnType::Integer),
        Column::new("gadget_id", ColumnType::Integer),
        Column::new("wins", ColumnType::Integer),
        Column::new("kills", ColumnType::Integer),
        Column::new("deaths", ColumnType::Integer),
        Column::new("picks", ColumnType::Integer),
    ],
    foreign_keys: &[
        ForeignKey::new("platform_id", "platform"),
        ForeignKey::new("operator_id", "operator"),
        ForeignKey::new("primaryweapon_id", "weapon"),
        ForeignKey::new("primarysight_id", "attachment"),
        ForeignKey::new("primarygrip_id", "attachment"),
        ForeignKey::new("primaryunderbarrel_id", "attachment"),
        ForeignKey::new("primarybarrel_id", "attachment"),
        ForeignKey::new("secondaryweapon_id", "weapon"),
        ForeignKey::new("secondarysight_id", "attachment"),
        ForeignKey::new("secondarygrip_id", "attachment"),
        ForeignKey::new("secondaryunderbarrel_id", "attachment"),
        ForeignKey::new("secondarybarrel_id", "attachment"),
        ForeignKey::new("gadget_id", "gadget"),
    ],
    indexes: &[],
};

// =============================================================================
// Schema Registry
// =============================================================================

/// All table schemas in dependency order
pub static ALL_TABLES: &[&TableSchema] = &[
    // Wave 1: No dependencies
    &PLATFORM,
    &GAMEMODE,
    &MAP,
    &ROLE,
    &CTU,
    &SKILLRANK,
    &WEAPONTYPE,
    &ENDROUNDREASON,
    &GADGET,
    &ATTACHMENT,
    // Wave 2: Level 1 deps
    &ATTACHMENT_SIGHT,
    &ATTACHMENT_GRIP,
    &ATTACHMENT_UNDERBARREL,
    &ATTACHMENT_BARREL,
    &OBJECTIVE,
    &OPERATOR,
    &WEAPON,
    &MATCH,
    // Wave 3: Level 2 deps
    &ROUND,
    // Facts
    &STAT_OBJECTIVE,
    &STAT_LOADOUT,
];

/// Get table schema by name
pub fn get_table(name: &str) -> Option<&'static TableSchema> {
    ALL_TABLES.iter().find(|t| t.name == name).copied()
}
