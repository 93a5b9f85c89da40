//! Declarative mapping from export columns to star-schema rows
//!
//! A [`Binding`] fills one dimension table from a fixed set of record fields.
//! Several bindings may feed the same table (primary and secondary weapons
//! both land in `weapon`); they then share that table's registry, so their
//! natural keys must have the same shape.

/// Placeholder written by the exporter for an empty attachment or gadget slot
pub const NONE_SENTINEL: &str = "None";

/// Where a column value comes from
#[derive(Debug, Clone, Copy)]
pub enum Source {
    /// Field text stored verbatim
    Text(&'static str),
    /// Field parsed as an integer
    Integer(&'static str),
    /// Surrogate key of the `table` row whose natural key is built from `key`.
    /// With `optional`, a sentinel in any key field yields NULL.
    Ref {
        table: &'static str,
        key: &'static [&'static str],
        optional: bool,
    },
}

impl Source {
    /// Record fields this value is computed from
    pub fn fields(&self) -> &[&'static str] {
        match self {
            Source::Text(field) | Source::Integer(field) => std::slice::from_ref(field),
            Source::Ref { key, .. } => key,
        }
    }
}

const fn text(field: &'static str) -> Source {
    Source::Text(field)
}

const fn integer(field: &'static str) -> Source {
    Source::Integer(field)
}

const fn reference(table: &'static str, key: &'static [&'static str]) -> Source {
    Source::Ref {
        table,
        key,
        optional: false,
    }
}

const fn optional_ref(table: &'static str, key: &'static [&'static str]) -> Source {
    Source::Ref {
        table,
        key,
        optional: true,
    }
}

/// Rule populating one dimension table
#[derive(Debug)]
pub struct Binding {
    pub table: &'static str,
    /// Record fields forming the natural key
    pub key: &'static [&'static str],
    pub columns: &'static [(&'static str, Source)],
    /// Skip the binding when any key field holds [`NONE_SENTINEL`]
    pub skip_sentinel: bool,
}

/// Rule producing one fact row per record
#[derive(Debug)]
pub struct FactBinding {
    pub table: &'static str,
    /// Fields that must be in the header for this fact to be imported
    pub requires: &'static [&'static str],
    pub columns: &'static [(&'static str, Source)],
}

macro_rules! name_binding {
    ($table:expr, $field:expr) => {
        Binding {
            table: $table,
            key: &[$field],
            columns: &[("name", Source::Text($field))],
            skip_sentinel: false,
        }
    };
}

macro_rules! slot_bindings {
    ($subset:expr, $field:expr) => {
        [
            Binding {
                table: "attachment",
                key: &[$field],
                columns: &[("name", Source::Text($field))],
                skip_sentinel: true,
            },
            Binding {
                table: $subset,
                key: &[$field],
                columns: &[("attachment_id", reference("attachment", &[$field]))],
                skip_sentinel: true,
            },
        ]
    };
}

const OBJECTIVE_KEY: &[&str] = &["objectivelocation", "mapname", "gamemode"];
const OPERATOR_KEY: &[&str] = &["operator", "ctu", "role"];
const PRIMARY_WEAPON_KEY: &[&str] = &["primaryweapon", "primaryweapontype"];
const SECONDARY_WEAPON_KEY: &[&str] = &["secondaryweapon", "secondaryweapontype"];

pub static DIMENSION_BINDINGS: &[Binding] = &[
    name_binding!("platform", "platform"),
    name_binding!("gamemode", "gamemode"),
    name_binding!("map", "mapname"),
    name_binding!("role", "role"),
    name_binding!("role", "winrole"),
    name_binding!("ctu", "ctu"),
    name_binding!("skillrank", "skillrank"),
    name_binding!("weapontype", "primaryweapontype"),
    name_binding!("weapontype", "secondaryweapontype"),
    name_binding!("endroundreason", "endroundreason"),
    Binding {
        table: "gadget",
        key: &["secondarygadget"],
        columns: &[("name", text("secondarygadget"))],
        skip_sentinel: true,
    },
    Binding {
        table: "objective",
        key: OBJECTIVE_KEY,
        columns: &[
            ("name", text("objectivelocation")),
            ("map_id", reference("map", &["mapname"])),
            ("gamemode_id", reference("gamemode", &["gamemode"])),
        ],
        skip_sentinel: false,
    },
    Binding {
        table: "operator",
        key: OPERATOR_KEY,
        columns: &[
            ("name", text("operator")),
            ("ctu_id", reference("ctu", &["ctu"])),
            ("role_id", reference("role", &["role"])),
        ],
        skip_sentinel: false,
    },
    Binding {
        table: "weapon",
        key: PRIMARY_WEAPON_KEY,
        columns: &[
            ("name", text("primaryweapon")),
            ("weapontype_id", reference("weapontype", &["primaryweapontype"])),
        ],
        skip_sentinel: false,
    },
    Binding {
        table: "weapon",
        key: SECONDARY_WEAPON_KEY,
        columns: &[
            ("name", text("secondaryweapon")),
            ("weapontype_id", reference("weapontype", &["secondaryweapontype"])),
        ],
        skip_sentinel: false,
    },
    Binding {
        table: "match",
        key: &["matchid"],
        columns: &[
            ("external_id", text("matchid")),
            ("date", text("date")),
            ("map_id", reference("map", &["mapname"])),
            ("gamemode_id", reference("gamemode", &["gamemode"])),
        ],
        skip_sentinel: false,
    },
    Binding {
        table: "round",
        key: &["matchid", "roundnumber"],
        columns: &[
            ("match_id", reference("match", &["matchid"])),
            ("round_num", integer("roundnumber")),
            ("objective_id", reference("objective", OBJECTIVE_KEY)),
            ("winrole_id", reference("role", &["winrole"])),
            ("endroundreason_id", reference("endroundreason", &["endroundreason"])),
            ("duration", integer("roundduration")),
        ],
        skip_sentinel: false,
    },
];

pub static ATTACHMENT_BINDINGS: [[Binding; 2]; 8] = [
    slot_bindings!("attachment_sight", "primarysight"),
    slot_bindings!("attachment_grip", "primarygrip"),
    slot_bindings!("attachment_underbarrel", "primaryunderbarrel"),
    slot_bindings!("attachment_barrel", "primarybarrel"),
    slot_bindings!("attachment_sight", "secondarysight"),
    slot_bindings!("attachment_grip", "secondarygrip"),
    slot_bindings!("attachment_underbarrel", "secondaryunderbarrel"),
    slot_bindings!("attachment_barrel", "secondarybarrel"),
];

pub static FACT_BINDINGS: &[FactBinding] = &[
    FactBinding {
        table: "stat_objective",
        requires: &["objectivelocation", "operator"],
        columns: &[
            ("platform_id", reference("platform", &["platform"])),
            ("date", text("date")),
            ("objective_id", reference("objective", OBJECTIVE_KEY)),
            ("operator_id", reference("operator", OPERATOR_KEY)),
            ("skillrank_id", reference("skillrank", &["skillrank"])),
            ("wins", integer("nbwins")),
            ("kills", integer("nbkills")),
            ("deaths", integer("nbdeaths")),
            ("picks", integer("nbpicks")),
        ],
    },
    FactBinding {
        table: "stat_loadout",
        requires: &["operator", "primaryweapon"],
        columns: &[
            ("platform_id", reference("platform", &["platform"])),
            ("date", text("date")),
            ("operator_id", reference("operator", OPERATOR_KEY)),
            ("primaryweapon_id", reference("weapon", PRIMARY_WEAPON_KEY)),
            ("primarysight_id", optional_ref("attachment", &["primarysight"])),
            ("primarygrip_id", optional_ref("attachment", &["primarygrip"])),
            ("primaryunderbarrel_id", optional_ref("attachment", &["primaryunderbarrel"])),
            ("primarybarrel_id", optional_ref("attachment", &["primarybarrel"])),
            ("secondaryweapon_id", reference("weapon", SECONDARY_WEAPON_KEY)),
            ("secondarysight_id", optional_ref("attachment", &["secondarysight"])),
            ("secondarygrip_id", optional_ref("attachment", &["secondarygrip"])),
            ("secondaryunderbarrel_id", optional_ref("attachment", &["secondaryunderbarrel"])),
            ("secondarybarrel_id", optional_ref("attachment", &["secondarybarrel"])),
            ("gadget_id", optional_ref("gadget", &["secondarygadget"])),
            ("wins", integer("nbwins")),
            ("kills", integer("nbkills")),
            ("deaths", integer("nbdeaths")),
            ("picks", integer("nbpicks")),
        ],
    },
];

/// Every dimension binding, attachment slots included
pub fn all_bindings() -> impl Iterator<Item = &'static Binding> {
    DIMENSION_BINDINGS
        .iter()
        .chain(ATTACHMENT_BINDINGS.iter().flatten())
}
