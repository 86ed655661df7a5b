//! String sources feeding shader objects.
//!
//! A [`StringSource`] is a [`Changeable`] that produces a string. Shaders
//! listen to their source and re-upload it whenever it changes, which in turn
//! invalidates every program the shader is attached to.

use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::change::{ChangeSubject, Changeable};
use crate::context::Context;
use crate::error::GlError;

/// A changeable producer of shader source text.
pub trait StringSource: Changeable {
    /// The current text.
    fn string(&self) -> String;

    /// Short description for diagnostics.
    fn short_info(&self) -> String {
        "<string>".to_string()
    }
}

/// An in-memory source whose text can be replaced.
#[derive(Debug, Default)]
pub struct StaticStringSource {
    text: RefCell<String>,
    subject: ChangeSubject,
}

impl StaticStringSource {
    pub fn new(text: impl Into<String>) -> Rc<Self> {
        Rc::new(Self {
            text: RefCell::new(text.into()),
            subject: ChangeSubject::new(),
        })
    }

    /// Replace the text and notify listeners.
    pub fn set_string(&self, text: impl Into<String>) {
        *self.text.borrow_mut() = text.into();
        self.changed();
    }
}

impl Changeable for StaticStringSource {
    fn change_subject(&self) -> &ChangeSubject {
        &self.subject
    }
}

impl StringSource for StaticStringSource {
    fn string(&self) -> String {
        self.text.borrow().clone()
    }
}

/// A source backed by a file on disk.
///
/// Open files are registered in the context's
/// [`FileRegistry`](crate::FileRegistry) so they can all be reloaded at once.
/// A file that cannot be read reports the error and yields an empty string,
/// which then fails shader compilation.
pub struct File {
    context: Rc<Context>,
    path: PathBuf,
    contents: RefCell<String>,
    subject: ChangeSubject,
}

impl File {
    /// Open `path` and register it with the context.
    pub fn open(context: &Rc<Context>, path: impl AsRef<Path>) -> Rc<Self> {
        let file = Rc::new(Self {
            context: Rc::clone(context),
            path: path.as_ref().to_path_buf(),
            contents: RefCell::new(String::new()),
            subject: ChangeSubject::new(),
        });
        if let Err(error) = file.load() {
            context.report(error);
        }
        context.files().register(&file);
        log::trace!("File: opened {}", file.path.display());
        file
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn context(&self) -> &Rc<Context> {
        &self.context
    }

    /// Re-read the file and notify listeners.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read; the previous contents and
    /// listeners are left untouched.
    pub fn reload(&self) -> Result<(), GlError> {
        self.load()?;
        log::debug!("File: reloaded {}", self.path.display());
        self.changed();
        Ok(())
    }

    fn load(&self) -> Result<(), GlError> {
        let text = std::fs::read_to_string(&self.path).map_err(|err| GlError::Io {
            path: self.path.clone(),
            reason: err.to_string(),
        })?;
        *self.contents.borrow_mut() = text;
        Ok(())
    }
}

impl Changeable for File {
    fn change_subject(&self) -> &ChangeSubject {
        &self.subject
    }
}

impl StringSource for File {
    fn string(&self) -> String {
        self.contents.borrow().clone()
    }

    fn short_info(&self) -> String {
        self.path.display().to_string()
    }
}

impl Drop for File {
    fn drop(&mut self) {
        self.context.files().deregister(self);
    }
}

impl std::fmt::Debug for File {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("File").field("path", &self.path).finish()
    }
}
