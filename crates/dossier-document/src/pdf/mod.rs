// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF module: reading, merging, rotating, stamping, and creating PDFs.

pub mod merge;
pub mod pages;
pub mod reader;
pub mod stamp;
pub mod writer;

pub use merge::{OrientationPolicy, PdfMerger};
pub use pages::PageGeometry;
pub use reader::PdfReader;
pub use stamp::PageOverlay;
pub use writer::PdfWriter;
