use crate::error::{Error, Result};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufWriter, ErrorKind, Write};
use std::path::{Component, Path, PathBuf};

/// Destination for generated artifacts.
///
/// A generation run writes every artifact with [`ArtifactSink::write_artifact`]
/// and then calls [`ArtifactSink::commit`] once. Implementations must not make
/// an artifact visible before `commit` succeeds, so a failing run never leaves
/// half of a particle/parameter pair behind.
pub trait ArtifactSink {
    /// Write the artifact `name`, one line per item.
    fn write_artifact<I>(&mut self, name: &str, lines: I) -> Result<()>
    where
        I: IntoIterator,
        I::Item: AsRef<str>;

    /// Publish all artifacts written so far.
    fn commit(&mut self) -> Result<()>;
}

/// Writes artifacts as files below a root directory.
///
/// Artifact names may contain directories below the root, which are created
/// as needed. Each artifact is first written to a hidden staging file next to
/// its final path. `commit` renames the staged files into place; dropping the sink
/// without committing removes them.
#[derive(Debug)]
pub struct DirectorySink {
    root: PathBuf,
    staged: Vec<Staged>,
}

#[derive(Debug)]
struct Staged {
    partial: PathBuf,
    target: PathBuf,
}

impl DirectorySink {
    /// Create a sink writing below `root`. The directory is created if missing.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|source| Error::ArtifactWriteFailure {
            path: root.clone(),
            source,
        })?;
        Ok(Self {
            root,
            staged: Vec::new(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Final path of artifact `name`.
    pub fn path_of(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    fn discard(&mut self) {
        for s in self.staged.drain(..) {
            if let Err(e) = fs::remove_file(&s.partial) {
                if e.kind() == ErrorKind::NotFound {
                    continue;
                }
                tracing::warn!(path = %s.partial.display(), error = %e, "could not remove staged artifact");
            }
        }
    }
}

fn write_lines<I>(path: &Path, lines: I) -> std::io::Result<()>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let mut w = BufWriter::new(File::create(path)?);
    for line in lines {
        w.write_all(line.as_ref().as_bytes())?;
        w.write_all(b"\n")?;
    }
    let file = w.into_inner().map_err(|e| e.into_error())?;
    file.sync_all()
}

/// Hidden file next to `target`: `dir/.name.<tag>`.
fn sibling(target: &Path, tag: &str) -> PathBuf {
    let name = target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    target.with_file_name(format!(".{name}.{tag}"))
}

/// Artifact names are relative paths that stay below the sink root.
fn check_name(name: &str) -> std::io::Result<()> {
    let path = Path::new(name);
    let escapes = path
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
    if name.is_empty() || escapes || path.file_name().is_none() {
        return Err(std::io::Error::new(
            ErrorKind::InvalidInput,
            format!("artifact name {name:?} must be a relative path below the output directory"),
        ));
    }
    Ok(())
}

fn stage(partial: &Path, lines: impl IntoIterator<Item = impl AsRef<str>>) -> std::io::Result<()> {
    if let Some(dir) = partial.parent() {
        fs::create_dir_all(dir)?;
    }
    write_lines(partial, lines)
}

/// A target that existed before the commit, moved aside until the new pair is in place.
struct Backup {
    saved: PathBuf,
    target: PathBuf,
}

impl ArtifactSink for DirectorySink {
    fn write_artifact<I>(&mut self, name: &str, lines: I) -> Result<()>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let target = self.path_of(name);
        let result = check_name(name).and_then(|()| {
            let partial = sibling(&target, "partial");
            match stage(&partial, lines) {
                Ok(()) => Ok(partial),
                Err(e) => {
                    // The failed file is not yet tracked; remove it with the rest.
                    let _ = fs::remove_file(&partial);
                    Err(e)
                }
            }
        });
        match result {
            Ok(partial) => {
                tracing::debug!(path = %partial.display(), "staged artifact");
                self.staged.push(Staged { partial, target });
                Ok(())
            }
            Err(source) => {
                self.discard();
                Err(Error::ArtifactWriteFailure {
                    path: target,
                    source,
                })
            }
        }
    }

    /// Move every staged artifact into place.
    ///
    /// Existing targets are renamed aside first and only removed once all
    /// renames succeeded. On failure the new files are removed and the
    /// previous ones restored, so the directory keeps the old pair.
    fn commit(&mut self) -> Result<()> {
        let staged = std::mem::take(&mut self.staged);
        let mut backups = Vec::new();
        let mut published = Vec::new();
        if let Err((path, source)) = publish(&staged, &mut backups, &mut published) {
            for target in &published {
                let _ = fs::remove_file(target);
            }
            for b in &backups {
                if let Err(e) = fs::rename(&b.saved, &b.target) {
                    tracing::warn!(path = %b.target.display(), error = %e, "could not restore previous artifact");
                }
            }
            self.staged = staged;
            self.discard();
            return Err(Error::ArtifactWriteFailure { path, source });
        }
        for b in &backups {
            if let Err(e) = fs::remove_file(&b.saved) {
                tracing::warn!(path = %b.saved.display(), error = %e, "could not remove previous artifact");
            }
        }
        for target in &published {
            tracing::info!(path = %target.display(), "wrote artifact");
        }
        Ok(())
    }
}

fn publish(
    staged: &[Staged],
    backups: &mut Vec<Backup>,
    published: &mut Vec<PathBuf>,
) -> std::result::Result<(), (PathBuf, std::io::Error)> {
    for s in staged {
        if s.target.is_file() {
            let saved = sibling(&s.target, "previous");
            fs::rename(&s.target, &saved).map_err(|e| (s.target.clone(), e))?;
            backups.push(Backup {
                saved,
                target: s.target.clone(),
            });
        }
    }
    for s in staged {
        fs::rename(&s.partial, &s.target).map_err(|e| (s.target.clone(), e))?;
        published.push(s.target.clone());
    }
    Ok(())
}

impl Drop for DirectorySink {
    fn drop(&mut self) {
        self.discard();
    }
}

/// Keeps artifacts in memory, keyed by name.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MemorySink {
    pending: BTreeMap<String, Vec<String>>,
    committed: BTreeMap<String, Vec<String>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Committed lines of artifact `name`.
    pub fn lines(&self, name: &str) -> Option<&[String]> {
        self.committed.get(name).map(Vec::as_slice)
    }

    /// Committed artifact `name` as file content (every line newline-terminated).
    pub fn contents(&self, name: &str) -> Option<String> {
        self.lines(name).map(|lines| {
            lines.iter().fold(String::new(), |mut acc, l| {
                acc.push_str(l);
                acc.push('\n');
                acc
            })
        })
    }

    /// Names of committed artifacts, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.committed.keys().map(String::as_str)
    }
}

impl ArtifactSink for MemorySink {
    fn write_artifact<I>(&mut self, name: &str, lines: I) -> Result<()>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let lines = lines.into_iter().map(|l| l.as_ref().to_owned()).collect();
        self.pending.insert(name.to_owned(), lines);
        Ok(())
    }

    fn commit(&mut self) -> Result<()> {
        self.committed.append(&mut self.pending);
        Ok(())
    }
}
