//! File system artifacts: MFTECmd, LECmd, JLECmd, RBCmd and RecentFileCacheParser.

use super::{ArtifactSchema, Field, TimeSpec};
use crate::timeline::UNKNOWN_USER;

/// Source-file MAC times shared by the LNK-style parsers.
const SOURCE_MAC: &[(&str, &str)] = &[
    ("SourceCreated", "C"),
    ("SourceModified", "M"),
    ("SourceAccessed", "A"),
];

/// $STANDARD_INFORMATION (0x10) and $FILE_NAME (0x30) timestamps.
const MFT_TIMES: &[(&str, &str)] = &[
    ("Created0x10", "C1"),
    ("Created0x30", "C3"),
    ("LastModified0x10", "M1"),
    ("LastModified0x30", "M3"),
    ("LastRecordChange0x10", "R1"),
    ("LastRecordChange0x30", "R3"),
    ("LastAccess0x10", "A1"),
    ("LastAccess0x30", "A3"),
];

pub const SCHEMAS: &[ArtifactSchema] = &[
    ArtifactSchema {
        name: "recycle-bin",
        pattern: "*_RBCmd_Output.csv",
        time: TimeSpec::Single("DeletedOn"),
        source: Field::Constant("RecycleBin"),
        system: None,
        user: None,
    },
    ArtifactSchema {
        name: "jumplist",
        pattern: "*_*Destinations.csv",
        time: TimeSpec::Multi(SOURCE_MAC),
        source: Field::Constant("JumpList"),
        system: None,
        user: None,
    },
    ArtifactSchema {
        name: "lnk",
        pattern: "*_LECmd_Output.csv",
        time: TimeSpec::Multi(SOURCE_MAC),
        source: Field::Constant("LinkFile"),
        system: None,
        user: None,
    },
    ArtifactSchema {
        name: "usn-journal",
        pattern: "*_MFTECmd_$J_Output.csv",
        time: TimeSpec::Single("UpdateTimestamp"),
        source: Field::Constant("$J"),
        system: None,
        user: Some(Field::Constant(UNKNOWN_USER)),
    },
    ArtifactSchema {
        name: "mft",
        pattern: "*_MFTECmd_$MFT_Output.csv",
        time: TimeSpec::Multi(MFT_TIMES),
        source: Field::Constant("$MFT"),
        system: None,
        user: Some(Field::Constant(UNKNOWN_USER)),
    },
    ArtifactSchema {
        name: "recent-file-cache",
        pattern: "*_RecentFileCacheParser_Output.csv",
        time: TimeSpec::Multi(SOURCE_MAC),
        source: Field::Constant("RecentFileCache"),
        system: None,
        user: Some(Field::Constant(UNKNOWN_USER)),
    },
];
