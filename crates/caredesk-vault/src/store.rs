//! The vault store — all folder membership changes go through here.
//!
//! Reads are plain filesystem snapshots; a `list` result may be stale by
//! the time a follow-up `read` runs, and callers treat a `NotFound`
//! after a successful `list` as a normal race. Metadata patches land via
//! a temp file + rename in the target directory so a reader never sees a
//! half-written record; new records are written with an exclusive
//! `create_new` open so two producers can never both claim the same
//! filename.
//!
//! [`VaultStore::transition`] is move-then-confirm: the rename out of
//! the source folder doubles as the mutual-exclusion point (the second
//! of two concurrent callers finds the source gone and loses), then the
//! metadata patch is written in place. If the patch cannot be written
//! the file is renamed back, so on any failure the record remains
//! visible in exactly one folder.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use caredesk_record::{ActionRecord, codec};

use crate::error::{Result, VaultError};
use crate::folder::Folder;

/// A vault rooted at a directory containing the five lifecycle folders.
#[derive(Debug, Clone)]
pub struct VaultStore {
    root: PathBuf,
}

impl VaultStore {
    /// Open a vault at `root`, creating the root and any missing
    /// lifecycle folders.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        for folder in Folder::ALL {
            fs::create_dir_all(root.join(folder.as_dir()))?;
        }
        info!(root = %root.display(), "vault opened");
        Ok(Self { root })
    }

    /// The vault root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The directory backing a folder.
    pub fn dir(&self, folder: Folder) -> PathBuf {
        self.root.join(folder.as_dir())
    }

    /// The full path of a record file in a folder.
    pub fn path(&self, folder: Folder, filename: &str) -> PathBuf {
        self.dir(folder).join(filename)
    }

    /// Whether `filename` currently exists in `folder`.
    pub fn exists(&self, folder: Folder, filename: &str) -> bool {
        self.path(folder, filename).is_file()
    }

    /// Which folder, if any, currently holds `filename`.
    pub fn locate(&self, filename: &str) -> Option<Folder> {
        Folder::ALL.into_iter().find(|f| self.exists(*f, filename))
    }

    /// List the record filenames in a folder, sorted.
    ///
    /// Only `.md` files count as records; anything else (editor swap
    /// files, temp files from in-flight writes) is ignored.
    pub fn list(&self, folder: Folder) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(self.dir(folder))? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.ends_with(".md") && !name.starts_with('.') {
                names.push(name);
            }
        }
        names.sort();
        Ok(names)
    }

    /// Read the raw text of a record file.
    pub fn read_raw(&self, folder: Folder, filename: &str) -> Result<String> {
        let path = self.path(folder, filename);
        if !path.is_file() {
            return Err(VaultError::NotFound {
                filename: filename.to_string(),
                folder,
            });
        }
        Ok(fs::read_to_string(path)?)
    }

    /// Read and parse a record from a folder.
    pub fn read(&self, folder: Folder, filename: &str) -> Result<ActionRecord> {
        let raw = self.read_raw(folder, filename)?;
        Ok(codec::parse(filename, &raw)?)
    }

    /// Create a new record in an intake folder.
    ///
    /// Fails with [`VaultError::NotIntake`] for Approved/Done, and with
    /// [`VaultError::Conflict`] if the filename already exists anywhere
    /// in the vault (filenames are vault-wide identities).
    ///
    /// The write itself is exclusive (`create_new`), and a confirm pass
    /// afterwards resolves the race where two producers drop the same
    /// filename into two different intake folders at once: the copy in
    /// the earliest lifecycle folder wins and the other is removed, so
    /// the vault ends up holding the filename in exactly one place.
    pub fn create(&self, folder: Folder, record: &ActionRecord) -> Result<()> {
        if !folder.accepts_new_records() {
            return Err(VaultError::NotIntake(folder));
        }
        if let Some(holder) = self.locate(&record.filename) {
            return Err(VaultError::Conflict {
                filename: record.filename.clone(),
                folder: holder,
            });
        }

        let path = self.path(folder, &record.filename);
        let open = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path);
        let mut file = match open {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                return Err(VaultError::Conflict {
                    filename: record.filename.clone(),
                    folder,
                });
            }
            Err(e) => return Err(e.into()),
        };
        file.write_all(codec::serialize(record).as_bytes())?;
        drop(file);

        // Confirm single location. Both racers run the same tie-break,
        // so they agree on which copy survives.
        let other = Folder::ALL
            .into_iter()
            .filter(|f| *f != folder)
            .find(|f| self.exists(*f, &record.filename));
        if let Some(other) = other {
            if folder_rank(folder) < folder_rank(other) {
                warn!(
                    filename = %record.filename, %folder, duplicate = %other,
                    "removing duplicate created concurrently in another folder"
                );
                let _ = fs::remove_file(self.path(other, &record.filename));
            } else {
                let _ = fs::remove_file(&path);
                return Err(VaultError::Conflict {
                    filename: record.filename.clone(),
                    folder: other,
                });
            }
        }

        debug!(filename = %record.filename, %folder, "record created");
        Ok(())
    }

    /// Move a record between folders and patch its metadata, as one
    /// logical operation.
    ///
    /// The rename out of `from` is the mutual-exclusion point: when two
    /// callers race on the same filename, exactly one rename succeeds
    /// and the loser gets [`VaultError::NotFound`] (the engine upgrades
    /// that to a conflict when the record turns up downstream). If the
    /// metadata patch cannot be written after the move, the file is
    /// renamed back to `from` and [`VaultError::Transition`] is
    /// surfaced; the record is never duplicated or lost.
    pub fn transition(
        &self,
        filename: &str,
        from: Folder,
        to: Folder,
        mutate: impl FnOnce(ActionRecord) -> ActionRecord,
    ) -> Result<ActionRecord> {
        let src = self.path(from, filename);
        let dest = self.path(to, filename);

        if !src.is_file() {
            return Err(VaultError::NotFound {
                filename: filename.to_string(),
                folder: from,
            });
        }
        if dest.exists() {
            return Err(VaultError::Conflict {
                filename: filename.to_string(),
                folder: to,
            });
        }

        let record = self.read(from, filename)?;
        let updated = mutate(record);

        // The move. After this the record lives in `to`, still with its
        // pre-transition metadata.
        fs::rename(&src, &dest).map_err(|e| {
            // rename failed outright: nothing moved, source intact.
            if e.kind() == std::io::ErrorKind::NotFound {
                VaultError::NotFound {
                    filename: filename.to_string(),
                    folder: from,
                }
            } else {
                VaultError::Transition {
                    filename: filename.to_string(),
                    folder: from,
                    reason: format!("rename into {to} failed: {e}"),
                }
            }
        })?;

        // The patch. On failure, move the file back so it stays in the
        // source folder with its old metadata.
        if let Err(e) = self.write_atomic(&dest, &codec::serialize(&updated)) {
            warn!(filename, %from, %to, error = %e, "metadata patch failed, rolling back move");
            if let Err(rollback) = fs::rename(&dest, &src) {
                // Rollback failed too; retry once before giving up with
                // the record stranded in the target folder.
                if fs::rename(&dest, &src).is_err() {
                    return Err(VaultError::Transition {
                        filename: filename.to_string(),
                        folder: to,
                        reason: format!("patch failed ({e}) and rollback failed ({rollback})"),
                    });
                }
            }
            return Err(VaultError::Transition {
                filename: filename.to_string(),
                folder: from,
                reason: format!("metadata patch failed: {e}"),
            });
        }

        info!(filename, %from, %to, "record transitioned");
        Ok(updated)
    }

    /// Write `content` to `path` via a dot-prefixed temp file + rename,
    /// so readers never observe a partial record.
    fn write_atomic(&self, path: &Path, content: &str) -> std::io::Result<()> {
        let dir = path.parent().unwrap_or(&self.root);
        let tmp_name = format!(
            ".{}.tmp",
            path.file_name().map(|n| n.to_string_lossy()).unwrap_or_default()
        );
        let tmp = dir.join(tmp_name);
        fs::write(&tmp, content)?;
        match fs::rename(&tmp, path) {
            Ok(()) => Ok(()),
            Err(e) => {
                let _ = fs::remove_file(&tmp);
                Err(e)
            }
        }
    }
}

/// Lifecycle order of a folder, used as the tie-break for concurrent
/// creates of the same filename.
fn folder_rank(folder: Folder) -> usize {
    Folder::ALL.iter().position(|f| *f == folder).unwrap_or(usize::MAX)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
