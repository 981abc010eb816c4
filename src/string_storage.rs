use std::{cell::RefCell, fmt, hash::Hash};

use rustc_hash::FxHashSet;

/// A handle to text owned by a [StringStorage]. Two handles handed out by the
/// same [StringInterner] are equal exactly when they point at the same text.
#[derive(Debug, Clone, Copy)]
pub struct Intern<'s>(pub &'s str);

impl<'s> Intern<'s> {
    pub fn as_str(&self) -> &'s str {
        self.0
    }
}

impl<'s> PartialEq for Intern<'s> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.0, other.0)
    }
}

impl<'s> Eq for Intern<'s> {}

impl<'s> Hash for Intern<'s> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        state.write_usize(self.0 as *const str as *const u8 as usize)
    }
}

impl<'s> fmt::Display for Intern<'s> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// Interns strings so that each unique string interned by a given instance of
/// this struct has a single unique address in memory.
pub struct StringInterner<'s> {
    storage: &'s StringStorage,
    strings: FxHashSet<&'s str>,
}

impl<'s> StringInterner<'s> {
    /// Creates a new string interner.
    pub fn new(storage: &'s StringStorage) -> StringInterner<'s> {
        StringInterner {
            storage,
            strings: FxHashSet::default(),
        }
    }

    /// Takes ownership of the given string and interns it.
    pub fn intern(&mut self, s: String) -> Intern<'s> {
        if let Some(s) = self.strings.get(&*s) {
            Intern(s)
        } else {
            let stored = self.storage.store(s.into());
            self.strings.insert(stored);
            Intern(stored)
        }
    }

    /// Interns a borrowed slice, copying it only the first time it is seen.
    pub fn intern_str(&mut self, s: &str) -> Intern<'s> {
        if let Some(s) = self.strings.get(s) {
            Intern(s)
        } else {
            self.intern(s.to_owned())
        }
    }
}

/// Storage for strings interned by a [StringInterner]. The driver owns one of
/// these per compilation unit; every token, tree node and diagnostic that
/// borrows source text borrows it from here, so it must outlive the scan,
/// the parse and the lowering of that unit.
pub struct StringStorage {
    strings: RefCell<Vec<*mut str>>,
}

impl StringStorage {
    pub fn new() -> StringStorage {
        StringStorage {
            strings: RefCell::new(Vec::new()),
        }
    }

    pub fn store(&self, string: Box<str>) -> &str {
        let string = Box::leak(string);

        let mut strings = self.strings.borrow_mut();
        strings.push(string as *mut _);

        string
    }
}

impl Default for StringStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for StringStorage {
    fn drop(&mut self) {
        let strings = self.strings.get_mut();
        for string in strings.drain(..) {
            // SAFETY: each of these pointers was returned by Box::leak in `store`,
            //         and the lifetime given out for these strings is only valid
            //         for as long as the StringStorage stays alive, so these
            //         strings should no longer be referenced.
            unsafe {
                drop(Box::from_raw(string));
            }
        }
    }
}
