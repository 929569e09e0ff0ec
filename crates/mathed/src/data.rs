//! MathData - one editable cell of a formula
//!
//! An ordered sequence of atoms: a grid cell, a fraction numerator, a
//! script branch. Owns its atoms exclusively; layout passes only read it.

use crate::class::MathClass;
use crate::coords::addr_of;
use crate::dimension::Dimension;
use crate::inset::{InsetMath, MathAtom};
use crate::metrics::{MetricsInfo, PainterInfo};
use crate::row::MathRow;
use crate::script::ScriptCollapse;
use crate::write::WriteStream;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Deref, DerefMut};

/// One editable cell: an insertion-order-significant sequence of atoms
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MathData {
    atoms: Vec<MathAtom>,
}

impl MathData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a cell of plain character atoms from a string
    pub fn from_str_atoms(s: &str) -> Self {
        Self {
            atoms: s.chars().map(MathAtom::char).collect(),
        }
    }

    pub fn push(&mut self, atom: MathAtom) {
        self.atoms.push(atom);
    }

    pub fn insert(&mut self, pos: usize, atom: MathAtom) {
        self.atoms.insert(pos, atom);
    }

    pub fn remove(&mut self, pos: usize) -> MathAtom {
        self.atoms.remove(pos)
    }

    pub fn clear(&mut self) {
        self.atoms.clear();
    }

    /// Append all atoms of another cell
    pub fn append(&mut self, mut other: MathData) {
        self.atoms.append(&mut other.atoms);
    }

    /// Replace the atom at `pos` with a run of atoms
    pub fn splice_at(&mut self, pos: usize, replacement: Vec<MathAtom>) {
        self.atoms.splice(pos..=pos, replacement);
    }

    /// Apply a queued script-collapse edit to the script atom at `pos`.
    /// Returns false when the atom is no longer a script (already collapsed).
    pub fn apply_script_collapse(&mut self, pos: usize, collapse: ScriptCollapse) -> bool {
        let Some(atom) = self.atoms.get_mut(pos) else {
            return false;
        };
        match collapse {
            ScriptCollapse::ToNucleus => {
                let Some(script) = atom.as_script() else {
                    return false;
                };
                let nucleus: Vec<MathAtom> = script.nuc().iter().cloned().collect();
                self.splice_at(pos, nucleus);
                true
            }
            ScriptCollapse::DropSub | ScriptCollapse::DropSup => {
                let Some(script) = atom.as_script_mut() else {
                    return false;
                };
                script.apply_collapse(collapse);
                true
            }
        }
    }

    /// Class of the last atom, which is what adjacent spacing sees
    pub fn last_class(&self) -> MathClass {
        self.atoms.last().map_or(MathClass::Ord, |a| a.math_class())
    }

    /// Right-edge kerning of the last atom
    pub fn kerning(&self) -> i32 {
        self.atoms.last().map_or(0, |a| a.kerning())
    }

    /// Whether this cell is a single character-like box (affects script drops)
    pub fn is_char_box(&self) -> bool {
        self.atoms.len() == 1
            && (self.atoms[0].as_char().is_some() || self.atoms[0].as_symbol().is_some())
            && self.atoms[0].math_class() == MathClass::Ord
    }

    /// Metrics of this cell: linearize, space, then measure the flat row
    pub fn metrics(&self, mi: &mut MetricsInfo, dim: &mut Dimension) {
        dim.clear();
        let row = MathRow::new(&mi.base, self);
        row.metrics(mi, dim);
        mi.coords.cells.add_dim(addr_of(self), *dim);
    }

    /// Draw this cell at (x, y); the row is rebuilt deterministically
    pub fn draw(&self, pi: &mut PainterInfo, x: i32, y: i32) {
        pi.coords.cells.add_pos(addr_of(self), x, y);
        let row = MathRow::new(&pi.base, self);
        row.draw(pi, x, y);
    }

    /// The dimension cached by the last metrics pass
    pub fn cached_dim(&self, mi: &MetricsInfo) -> Dimension {
        mi.coords.cells.dim(addr_of(self)).unwrap_or_default()
    }

    pub fn write(&self, ws: &mut WriteStream) -> fmt::Result {
        for atom in &self.atoms {
            atom.write(ws)?;
        }
        Ok(())
    }

    /// MathML form of the cell contents (no enclosing row element)
    pub fn mathmlize(&self, ms: &mut crate::write::MathMLStream) -> crate::error::MathedResult<()> {
        for atom in &self.atoms {
            atom.mathmlize(ms)?;
        }
        Ok(())
    }

    /// HTML form of the cell contents
    pub fn htmlize(&self, hs: &mut crate::write::HtmlStream) -> crate::error::MathedResult<()> {
        for atom in &self.atoms {
            atom.htmlize(hs)?;
        }
        Ok(())
    }

    /// The cell serialized as a LaTeX string
    pub fn to_latex(&self) -> String {
        let mut buf = String::new();
        let mut ws = WriteStream::new(&mut buf);
        self.write(&mut ws).expect("writing to a String cannot fail");
        buf
    }
}

impl Deref for MathData {
    type Target = [MathAtom];
    fn deref(&self) -> &[MathAtom] {
        &self.atoms
    }
}

impl DerefMut for MathData {
    fn deref_mut(&mut self) -> &mut [MathAtom] {
        &mut self.atoms
    }
}

impl FromIterator<MathAtom> for MathData {
    fn from_iter<I: IntoIterator<Item = MathAtom>>(iter: I) -> Self {
        Self {
            atoms: iter.into_iter().collect(),
        }
    }
}

impl From<Vec<MathAtom>> for MathData {
    fn from(atoms: Vec<MathAtom>) -> Self {
        Self { atoms }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_str_atoms() {
        let cell = MathData::from_str_atoms("ab");
        assert_eq!(cell.len(), 2);
        assert_eq!(cell.to_latex(), "ab");
    }

    #[test]
    fn test_last_class() {
        let mut cell = MathData::from_str_atoms("a");
        cell.push(MathAtom::char('+'));
        assert_eq!(cell.last_class(), MathClass::Bin);
    }

    #[test]
    fn test_is_char_box() {
        assert!(MathData::from_str_atoms("x").is_char_box());
        assert!(!MathData::from_str_atoms("xy").is_char_box());
        assert!(!MathData::from_str_atoms("+").is_char_box());
        assert!(!MathData::new().is_char_box());
    }

    #[test]
    fn test_splice_at() {
        let mut cell = MathData::from_str_atoms("axc");
        cell.splice_at(1, vec![MathAtom::char('1'), MathAtom::char('2')]);
        assert_eq!(cell.to_latex(), "a12c");
    }
}
