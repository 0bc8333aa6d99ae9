//! Stand-ins for mutexes, semaphores and spinlocks.
//!
//! With a single thread of control there is never any contention, so every
//! synchronisation primitive collapses into a fixed token per resource kind.
//! Operations only check that they were handed the right token.

use crate::{OslError, Result};

/// Timeout value meaning "wait forever".
pub const WAIT_FOREVER: u16 = 0xffff;

/// The kind of synchronisation primitive a token stands in for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Mutex,
    Semaphore,
    Spinlock,
}

impl ResourceKind {
    /// The value shared by every token of this kind.
    pub const fn sentinel(self) -> usize {
        match self {
            ResourceKind::Mutex => 0x0b00_7ec5,
            ResourceKind::Semaphore => 0x0005_eba4,
            ResourceKind::Spinlock => 0x0591_d10c,
        }
    }

    #[inline]
    const fn index(self) -> usize {
        self as usize
    }
}

/// An opaque handle to a synchronisation primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    kind: ResourceKind,
    raw: usize,
}

impl Token {
    const fn minted(kind: ResourceKind) -> Self {
        Self {
            kind,
            raw: kind.sentinel(),
        }
    }

    /// Rebuild a token from a raw handle value received from the interpreter.
    pub const fn from_raw(kind: ResourceKind, raw: usize) -> Self {
        Self { kind, raw }
    }

    #[inline]
    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    #[inline]
    pub fn raw(&self) -> usize {
        self.raw
    }
}

/// Saved CPU state returned by acquiring a spinlock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CpuFlags(pub usize);

impl CpuFlags {
    /// Nothing is actually saved, so the value is constant.
    pub const SAVED: CpuFlags = CpuFlags(0x000f_1a85);
}

/// Hands out tokens and checks them on use.
///
/// Tokens are shared per kind rather than per instance. The registry only
/// counts how many of each kind are outstanding so a kind whose tokens were
/// all deleted stops validating.
#[derive(Debug, Default)]
pub struct TokenRegistry {
    live: [usize; 3],
}

impl TokenRegistry {
    pub const fn new() -> Self {
        Self { live: [0; 3] }
    }

    /// Create a mutex or spinlock token.
    pub fn create(&mut self, kind: ResourceKind) -> Token {
        self.live[kind.index()] += 1;
        Token::minted(kind)
    }

    /// Create a counting semaphore token.
    pub fn create_semaphore(&mut self, max_units: u32, initial_units: u32) -> Result<Token> {
        if initial_units > max_units {
            return Err(OslError::InvalidParameter);
        }
        Ok(self.create(ResourceKind::Semaphore))
    }

    pub fn delete(&mut self, kind: ResourceKind, token: Token) -> Result<()> {
        self.validate(kind, token)?;
        self.live[kind.index()] -= 1;
        Ok(())
    }

    /// Check a token for an acquire/release style operation on `kind`.
    pub fn validate(&self, kind: ResourceKind, token: Token) -> Result<()> {
        if token.kind != kind || token.raw != kind.sentinel() || self.live[kind.index()] == 0 {
            return Err(OslError::InvalidParameter);
        }
        Ok(())
    }

    /// Number of outstanding tokens of `kind`.
    #[inline]
    pub fn live(&self, kind: ResourceKind) -> usize {
        self.live[kind.index()]
    }

    pub fn reset(&mut self) {
        self.live = [0; 3];
    }
}
