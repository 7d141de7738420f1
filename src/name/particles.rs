//! Surname particles
//!
//! A particle is a leading surname word ("de", "van", "saint") ignored for
//! alphabetic ordering: "de Gaulle" sorts under G. The particle list is
//! configurable per database through `particles.txt`; the same list must be
//! used when building and when querying the sorted indices, or binary
//! search silently breaks.

use std::cmp::Ordering;
use std::fs;
use std::path::Path;

use crate::error::Result;

/// Built-in particle list, used when the database carries no
/// `particles.txt`. Entries include their trailing separator.
pub const DEFAULT_PARTICLES: &[&str] = &[
    "af ", "d'", "dal ", "de ", "del ", "della ", "des ", "di ", "du ", "of ", "saint ",
    "sainte ", "van ", "von und zu ", "von ", "zu ", "zur ",
];

/// Load a particle file: one particle per line, `_` standing for a trailing
/// space (so "de_" means the particle "de ")
pub fn load_particles(path: &Path) -> Result<Vec<String>> {
    let text = fs::read_to_string(path)?;
    Ok(text
        .lines()
        .map(|line| line.replace('_', " "))
        .filter(|p| !p.is_empty())
        .collect())
}

/// The default list as owned strings
pub fn default_particles() -> Vec<String> {
    DEFAULT_PARTICLES.iter().map(|s| s.to_string()).collect()
}

/// Strip one leading particle, if any
///
/// Case-insensitive prefix match; the longest matching particle wins.
pub fn surname_after_particle<'a>(particles: &[String], s: &'a str) -> &'a str {
    let mut best = 0usize;
    for p in particles {
        if p.len() > best {
            if let Some(prefix) = s.get(..p.len()) {
                if prefix.eq_ignore_ascii_case(p) {
                    best = p.len();
                }
            }
        }
    }
    &s[best..]
}

/// The canonical sort order of the surname index
///
/// Compare the remainders after particle stripping; tie-break on the full
/// strings so the order stays total.
pub fn compare_after_particle(particles: &[String], s1: &str, s2: &str) -> Ordering {
    let r1 = surname_after_particle(particles, s1);
    let r2 = surname_after_particle(particles, s2);
    r1.cmp(r2).then_with(|| s1.cmp(s2))
}
