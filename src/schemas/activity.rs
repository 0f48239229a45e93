//! Execution and activity artifacts: EvtxECmd, PECmd, SrumECmd, SumECmd and
//! the Windows 10 activity timeline.

use super::{ArtifactSchema, Field, TimeSpec};
use crate::reader::RawRow;
use crate::timeline::{UNKNOWN_SYSTEM, UNKNOWN_USER};

pub const SCHEMAS: &[ArtifactSchema] = &[
    ArtifactSchema {
        name: "win10-timeline",
        pattern: "*_Activity_PackageIDs.csv",
        time: TimeSpec::Single("Expires"),
        source: Field::Constant("WIN10_Timeline"),
        system: None,
        user: None,
    },
    ArtifactSchema {
        name: "prefetch",
        pattern: "*_PECmd_Output.csv",
        time: TimeSpec::Single("LastRun"),
        source: Field::Constant("PREFETCH"),
        system: Some(Field::Column {
            name: "Volume0Name",
            default: UNKNOWN_SYSTEM,
        }),
        user: Some(Field::Column {
            name: "UserName",
            default: UNKNOWN_USER,
        }),
    },
    ArtifactSchema {
        name: "srum",
        pattern: "*_SrumECmd_*.csv",
        time: TimeSpec::Single("Timestamp"),
        source: Field::Constant("SRUM"),
        system: None,
        user: Some(Field::Derived {
            consumes: &["UserName", "Sid"],
            derive: srum_user,
        }),
    },
    ArtifactSchema {
        name: "sum-client",
        pattern: "*_SumECmd_DETAIL_ClientDetailed_Output.csv",
        time: TimeSpec::Multi(&[("InsertDate", "I"), ("LastAccess", "L")]),
        source: Field::Constant("SUMdb"),
        system: Some(Field::Column {
            name: "IpAddress",
            default: UNKNOWN_SYSTEM,
        }),
        user: Some(Field::Column {
            name: "AuthenticatedUserName",
            default: UNKNOWN_USER,
        }),
    },
    ArtifactSchema {
        name: "evtx",
        pattern: "*_EvtxECmd_Output.csv",
        time: TimeSpec::Single("TimeCreated"),
        source: Field::Constant("EVTX"),
        system: Some(Field::Column {
            name: "Computer",
            default: UNKNOWN_SYSTEM,
        }),
        user: Some(Field::Column {
            name: "UserId",
            default: UNKNOWN_USER,
        }),
    },
];

/// `UserName (Sid)` when both are present.
fn srum_user(row: &RawRow<'_>) -> String {
    match (row.non_empty("UserName"), row.non_empty("Sid")) {
        (Some(name), Some(sid)) => format!("{name} ({sid})"),
        _ => UNKNOWN_USER.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::Header;

    #[test]
    fn srum_user_combines_name_and_sid() {
        let header = Header::new(vec!["UserName".into(), "Sid".into()]);
        let row = RawRow::new(&header, vec!["DESKTOP\\bob".into(), "S-1-5-21-1".into()], 2);
        assert_eq!(srum_user(&row), "DESKTOP\\bob (S-1-5-21-1)");
    }

    #[test]
    fn srum_user_needs_both_parts() {
        let header = Header::new(vec!["UserName".into(), "Sid".into()]);
        let row = RawRow::new(&header, vec!["bob".into(), "".into()], 2);
        assert_eq!(srum_user(&row), UNKNOWN_USER);
    }
}
