use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tlnorm::description::DescriptionBuilder;
use tlnorm::schemas::Registry;
use tlnorm::timeline::MasterTimeline;
use tlnorm::assembler::RunReport;

/// A scratch KAPE output tree.
pub struct Case {
    pub dir: TempDir,
}

impl Case {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("tempdir"),
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Write `contents` to `relative` under the case root.
    pub fn file(&self, relative: &str, contents: &str) -> PathBuf {
        let path = self.root().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create fixture dir");
        }
        fs::write(&path, contents).expect("write fixture");
        path
    }

    /// Run the built-in pipeline over the case root.
    pub fn run(&self, delimiter: char) -> (MasterTimeline, RunReport) {
        self.run_with_threads(delimiter, None)
    }

    /// Like [`Case::run`] with an explicit worker count (`parallel` builds).
    pub fn run_with_threads(
        &self,
        delimiter: char,
        threads: Option<usize>,
    ) -> (MasterTimeline, RunReport) {
        let registry = Registry::builtin().expect("builtin registry");
        let pipeline = tlnorm::pipeline::builtin(&registry, DescriptionBuilder::new(delimiter))
            .expect("builtin pipeline")
            .with_threads(threads);
        pipeline.run(self.root())
    }
}

pub const EVTX: &str = "\
TimeCreated,EventId,Computer,UserId,Payload
2021-03-04 05:06:07.1234567,4624,WS01,S-1-5-18,\"logon\tvia\nnetwork\"
2021-03-04 05:06:07,4634,WS01,S-1-5-18,logoff
not-a-time,4625,WS01,S-1-5-18,failed
";

pub const MFT: &str = "\
EntryNumber,FileName,Created0x10,Created0x30,LastModified0x10,LastModified0x30,LastRecordChange0x10,LastRecordChange0x30,LastAccess0x10,LastAccess0x30
42,a.txt,2020-01-01T00:00:00,2020-01-01T00:00:00,2020-01-02T00:00:00,,,,,
";

pub const RECYCLE_BIN: &str = "\
SourceName,DeletedOn,FileName
C:\\$Recycle.Bin\\S-1-5-21-1001\\$IABC.txt,2020-06-01 12:00:00,report.docx
";

pub const USER_ASSIST: &str = "\
ProgramName,RunCounter,LastExecuted
chrome.exe,3,2019-12-31 23:59:59
";
