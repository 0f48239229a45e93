//! Registry hive artifacts: RECmd batch plugins, SBECmd shellbags,
//! AmcacheParser and AppCompatCacheParser.
//!
//! None of these exports carry a user column; the user comes from the hive
//! path or the export filename.

use super::{ArtifactSchema, Field, TimeSpec};

pub const SCHEMAS: &[ArtifactSchema] = &[
    ArtifactSchema {
        name: "shellbags-ntuser",
        pattern: "*_NTUSER.csv",
        time: TimeSpec::Single("LastWriteTime"),
        source: Field::Constant("ShellBags"),
        system: None,
        user: None,
    },
    ArtifactSchema {
        name: "shellbags-usrclass",
        pattern: "*_UsrClass.csv",
        time: TimeSpec::Single("LastWriteTime"),
        source: Field::Constant("ShellBags"),
        system: None,
        user: None,
    },
    ArtifactSchema {
        name: "amcache-file-entries",
        pattern: "*_Amcache_*FileEntries.csv",
        time: TimeSpec::Single("FileKeyLastWriteTimestamp"),
        source: Field::Constant("AMCACHE"),
        system: None,
        user: None,
    },
    ArtifactSchema {
        name: "appcompatcache",
        pattern: "*_Windows10Creators_SYSTEM_AppCompatCache.csv",
        time: TimeSpec::Single("LastModifiedTimeUTC"),
        source: Field::Constant("AppCompatCache"),
        system: None,
        user: None,
    },
    ArtifactSchema {
        name: "amcache",
        pattern: "*_Amcache_*.csv",
        time: TimeSpec::Single("KeyLastWriteTimestamp"),
        source: Field::Constant("AMCACHE"),
        system: None,
        user: None,
    },
    ArtifactSchema {
        name: "run-mru",
        pattern: "*_RunMRU__*_Users_*_NTUSER.DAT.csv",
        time: TimeSpec::Single("OpenedOn"),
        source: Field::Constant("RunMRU"),
        system: None,
        user: None,
    },
    ArtifactSchema {
        name: "recmd-user-activity",
        pattern: "*_RECmd_Batch_UserActivity_Output.csv",
        time: TimeSpec::Single("LastWriteTimestamp"),
        source: Field::Constant("REGISTRY"),
        system: None,
        user: None,
    },
    ArtifactSchema {
        name: "user-assist",
        pattern: "*_UserAssist__*_Users_*_NTUSER.DAT.csv",
        time: TimeSpec::Single("LastExecuted"),
        source: Field::Constant("UserAssist"),
        system: None,
        user: None,
    },
    ArtifactSchema {
        name: "bam-dam",
        pattern: "*_BamDam__*_Windows_System32_config_SYSTEM.csv",
        time: TimeSpec::Single("ExecutionTime"),
        source: Field::Constant("BamDam"),
        system: None,
        user: None,
    },
    ArtifactSchema {
        name: "recent-docs",
        pattern: "*_RecentDocs__*_Users_*_NTUSER.DAT.csv",
        time: TimeSpec::Single("ExtensionLastOpened"),
        source: Field::Constant("RecentDocs"),
        system: None,
        user: None,
    },
];
