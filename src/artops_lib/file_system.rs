use std::fs;
use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;

use anyhow::Context;
use anyhow::Result;
use log::debug;
use log::info;
use log::trace;
use log::warn;
use serde::de::DeserializeOwned;
use tar::Builder;

use crate::bailc;
use crate::constants::TEMP_SUFFIX;
use crate::error::ctx;

/// Interactor with the actual physical file system.
#[derive(Clone, Copy, Debug)]
pub struct FileSystemInteractor {
    /// If true this will not write nor store any state to the file system.
    pub dry_run: bool,
}

/// This defines all interactions of artops with the filesystem.
pub trait FileOperations {
    /// Read a file into raw bytes.
    fn read_bytes(&self, path: &Path) -> Result<Vec<u8>>;

    /// Read a file into a utf8 string.
    fn read_utf8(&self, path: &Path) -> Result<String>;

    /// Try to deserialize a toml file into a struture `T`.
    fn try_read_toml<T: DeserializeOwned>(&self, path: &Path) -> Result<T>;

    /// Write a [String] to a file.
    fn write_utf8_truncate(&self, path: &Path, data: &str) -> Result<()>;

    /// Write `contents` next to `path` as a temporary file and replace
    /// `path` with it only if the bytes differ.
    ///
    /// Returns whether the original was replaced. The temporary file never
    /// survives the call.
    fn replace_if_changed(&self, path: &Path, contents: &str) -> Result<bool>;

    /// Create a directory and all of its parents.
    fn create_dir_all(&self, path: &Path) -> Result<()>;

    /// The entries of a directory, sorted by path.
    fn list_dir(&self, path: &Path) -> Result<Vec<PathBuf>>;

    /// The size of a file in bytes.
    fn file_size(&self, path: &Path) -> Result<u64>;

    /// Rename a file, the target must not exist yet.
    fn move_file(&self, from: &Path, to: &Path) -> Result<()>;

    /// Copy a file, keeping its permissions.
    fn copy_file(&self, from: &Path, to: &Path) -> Result<()>;

    /// Remove a directory tree.
    fn remove_dir_all(&self, path: &Path) -> Result<()>;

    /// Create a new .tar at `path` holding `members` (relative to `base`).
    ///
    /// Fails if anything already exists at `path`.
    fn write_archive(&self, path: &Path, base: &Path, members: &[PathBuf]) -> Result<()>;

    /// Given a path try to canonicalize it.
    ///
    /// This will fail for files that do not exist.
    fn canonicalize(&self, path: &Path) -> Result<PathBuf>;
}

/// Passes writes through until [AbandonGuard::abandon] is called, after
/// which every write fails.
///
/// [Builder] finishes the archive when dropped. Once a member failed that
/// trailer must not reach the destination, or a truncated archive would
/// look complete.
struct AbandonGuard<W> {
    /// The destination.
    inner: W,

    /// Set once the archive is known to be incomplete.
    abandoned: bool,
}

impl<W: Write> AbandonGuard<W> {
    /// Refuse all further writes.
    fn abandon(&mut self) {
        self.abandoned = true;
    }
}

impl<W: Write> Write for AbandonGuard<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.abandoned {
            return Err(io::Error::other("the archive was abandoned"));
        }

        self.inner.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        if self.abandoned {
            return Ok(());
        }

        self.inner.flush()
    }
}

/// Stream `members` (paths relative to `base`) as a tar archive into `writer`.
///
/// Directories are added recursively. Returns the writer once the archive
/// trailer has been written. If a member cannot be added nothing more is
/// written, the trailer included.
pub fn pack<W: Write>(writer: W, base: &Path, members: &[PathBuf]) -> Result<W> {
    let mut builder = Builder::new(AbandonGuard {
        inner: writer,
        abandoned: false,
    });
    builder.follow_symlinks(false);

    for member in members {
        let source = base.join(member);
        trace!("Packing {source:?} as {member:?}");

        let added = if source.is_dir() {
            builder.append_dir_all(member, &source)
        } else {
            builder.append_path_with_name(&source, member)
        };

        if let Err(e) = added {
            builder.get_mut().abandon();

            return Err(e).with_context(ctx!(
              "Could not add {source:?} to the archive", ;
              "Ensure that the file exists and is readable",
            ));
        }
    }

    let guard = builder.into_inner().with_context(ctx!(
      "Could not finish writing the archive", ;
      "The destination may be full or the connection may have dropped",
    ))?;

    Ok(guard.inner)
}

impl FileOperations for FileSystemInteractor {
    fn read_bytes(&self, path: &Path) -> Result<Vec<u8>> {
        fs::read(path).with_context(ctx!(
          "Could not read the file {path:?}", ;
          "Ensure that the file exists and you have permissions to access it",
        ))
    }

    fn read_utf8(&self, path: &Path) -> Result<String> {
        String::from_utf8(self.read_bytes(path)?).with_context(ctx!(
          "{path:?} is not valid UTF-8", ;
          "The file doesn't seem to be human readable?",
        ))
    }

    fn try_read_toml<T: DeserializeOwned>(&self, path: &Path) -> Result<T> {
        toml::from_str::<T>(&self.read_utf8(path)?).with_context(ctx!(
          "Could not deserialize toml file {path:?}", ;
          "Ensure that the file is valid toml",
        ))
    }

    fn write_utf8_truncate(&self, path: &Path, data: &str) -> Result<()> {
        if self.dry_run {
            debug!("Would have written to {path:?} (dry)");
            return Ok(());
        }

        fs::write(path, data.as_bytes()).with_context(ctx!(
          "Could not write to the file {path:?}", ;
          "Ensure that you have permissions to write it",
        ))
    }

    fn replace_if_changed(&self, path: &Path, contents: &str) -> Result<bool> {
        let original = self.read_bytes(path)?;

        if self.dry_run {
            let changed = original != contents.as_bytes();
            if changed {
                info!("Would have replaced {path:?} (dry)");
            }
            return Ok(changed);
        }

        let mut temp = path.as_os_str().to_owned();
        temp.push(TEMP_SUFFIX);
        let temp = PathBuf::from(temp);

        debug!("Writing the edited copy to {temp:?}");
        fs::write(&temp, contents.as_bytes()).with_context(ctx!(
          "Could not write the temporary file {temp:?}", ;
          "Ensure that you have permissions to write next to {path:?}",
        ))?;

        let written = self.read_bytes(&temp)?;

        if written == original {
            debug!("{path:?} is unchanged");
            fs::remove_file(&temp).with_context(ctx!(
              "Could not remove the temporary file {temp:?}", ;
              "Remove it by hand, the original was not modified",
            ))?;
            return Ok(false);
        }

        let permissions = fs::metadata(path)
            .with_context(ctx!(
              "Could not read the permissions of {path:?}", ;
              "",
            ))?
            .permissions();
        fs::set_permissions(&temp, permissions).with_context(ctx!(
          "Could not copy the permissions of {path:?}", ;
          "",
        ))?;

        info!("Replacing {path:?}");
        fs::rename(&temp, path).with_context(ctx!(
          "Could not replace {path:?} with {temp:?}", ;
          "The edited version is left at {temp:?}",
        ))?;

        Ok(true)
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        if self.dry_run {
            debug!("Would have created {path:?} (dry)");
            return Ok(());
        }

        debug!("Creating directories for {:?}", path);
        fs::create_dir_all(path).with_context(ctx!(
           "Could not create {path:?}", ;
           "Ensure that you have sufficient permissions",
        ))
    }

    fn list_dir(&self, path: &Path) -> Result<Vec<PathBuf>> {
        let mut entries = fs::read_dir(path)
            .with_context(ctx!(
              "Could not list the directory {path:?}", ;
              "Ensure that the directory exists and you have permissions to read it",
            ))?
            .map(|entry| entry.map(|e| e.path()))
            .collect::<std::io::Result<Vec<PathBuf>>>()
            .with_context(ctx!(
              "Could not read an entry of {path:?}", ;
              "",
            ))?;

        entries.sort();
        Ok(entries)
    }

    fn file_size(&self, path: &Path) -> Result<u64> {
        Ok(fs::metadata(path)
            .with_context(ctx!(
              "Could not get the size of {path:?}", ;
              "Ensure that the file exists",
            ))?
            .len())
    }

    fn move_file(&self, from: &Path, to: &Path) -> Result<()> {
        if to.exists() {
            bailc!(
                "The path exists.", ;
                "Refusing to move {from:?} over {to:?}.", ;
                "Remove the existing file first.",
            );
        }

        if self.dry_run {
            debug!("Would have moved {from:?} to {to:?} (dry)");
            return Ok(());
        }

        trace!("Moving {from:?} to {to:?}");
        fs::rename(from, to).with_context(ctx!(
          "Could not move {from:?} to {to:?}", ;
          "Both paths need to be on the same filesystem",
        ))
    }

    fn copy_file(&self, from: &Path, to: &Path) -> Result<()> {
        if self.dry_run {
            debug!("Would have copied {from:?} to {to:?} (dry)");
            return Ok(());
        }

        trace!("Copying {from:?} to {to:?}");
        fs::copy(from, to).with_context(ctx!(
          "Could not copy {from:?} to {to:?}", ;
          "Ensure that you have sufficient permissions",
        ))?;

        Ok(())
    }

    fn remove_dir_all(&self, path: &Path) -> Result<()> {
        if self.dry_run {
            debug!("Would have removed {path:?} (dry)");
            return Ok(());
        }

        info!("Removing {path:?}");
        fs::remove_dir_all(path).with_context(ctx!(
          "Could not remove {path:?}", ;
          "Ensure that you have sufficient permissions",
        ))
    }

    fn write_archive(&self, path: &Path, base: &Path, members: &[PathBuf]) -> Result<()> {
        if path.exists() {
            bailc!(
                "The path exists.", ;
                "A directory or file exists at {path:?}.", ;
                "Choose a path that is not already taken.",
            );
        }

        if self.dry_run {
            for member in members {
                debug!("Would have archived {member:?} into {path:?} (dry)");
            }
            return Ok(());
        }

        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .with_context(ctx!(
              "Could not create {path:?}", ;
              "Ensure that you have sufficient permissions",
            ))?;

        let written = pack(file, base, members).and_then(|file| {
            file.sync_all().with_context(ctx!(
              "Could not flush {path:?} to disk", ;
              "",
            ))
        });

        if written.is_err() {
            debug!("Removing the incomplete archive {path:?}");

            if let Err(e) = fs::remove_file(path) {
                warn!("Could not remove the incomplete archive {path:?}: {e}");
            }
        }

        written
    }

    fn canonicalize(&self, path: &Path) -> Result<PathBuf> {
        path.canonicalize().with_context(ctx!(
          "Could not canonicalize {path:?}", ;
          "Ensure that your path is valid",
        ))
    }
}

#[cfg(test)]
#[path = "tests/file_system.rs"]
mod tests;
