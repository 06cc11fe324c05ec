//! Pass Registry: the ordered list of editing passes.
//!
//! The default pipeline runs seven passes:
//!
//! 1. **Basic Typo Reviewer**
//! 2. **UK English Standardiser**
//! 3. **Flow and Polish**
//! 4. **Headings**
//! 5. **Proofreader**
//! 6. **Add Sources**
//! 7. **SEO Reviewer**

mod passes;

pub use passes::{PassDefinition, PassRegistry, is_filename_safe, standard_passes};
