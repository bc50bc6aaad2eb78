//! Pipeline stages for splitting a PDF into named single-page files.
//!
//! Each submodule implements one step and is testable on its own.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ document ──▶ text ──▶ identifier ──▶ sanitize
//! (magic)   (pdfium)    (layer     (tiered        (file-safe
//!                        or OCR)    regexes)       name)
//! ```
//!
//! 1. [`input`]      validate the staged upload before pdfium sees it
//! 2. [`document`]   open the PDF, read page text, rasterise, export pages
//! 3. [`text`]       text layer first, [`ocr`] over a rendered page otherwise
//! 4. [`identifier`] find the process number in the page text
//! 5. [`sanitize`]   turn the logical name into a safe file name
//!
//! [`encode`] turns rendered pages into PNG for the OCR engine.

pub mod document;
pub mod encode;
pub mod identifier;
pub mod input;
pub mod ocr;
pub mod sanitize;
pub mod text;
