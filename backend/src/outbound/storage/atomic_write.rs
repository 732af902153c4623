//! Whole-file replacement via a staged temporary file.

use std::io::{self, Write};

use cap_std::fs::Dir;
use uuid::Uuid;

/// Replace `name` in `dir` with `contents`.
///
/// The bytes are written to a hidden sibling, flushed to disk and renamed
/// over the target, so readers see either the old or the new file. The
/// staged file is removed when any step fails.
pub(super) fn replace_atomically(dir: &Dir, name: &str, contents: &[u8]) -> io::Result<()> {
    let staged = format!(".tmp-{}-{name}", Uuid::new_v4().simple());
    let result = (|| -> io::Result<()> {
        let mut file = dir.create(&staged)?;
        file.write_all(contents)?;
        file.sync_all()?;
        dir.rename(&staged, dir, name)
    })();
    if result.is_err() {
        let _cleanup = dir.remove_file(&staged);
    }
    result
}
