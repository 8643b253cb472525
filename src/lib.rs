#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![no_std]

pub use vellum_abi as abi;

#[cfg(feature = "codegen")]
pub use vellum_codegen as codegen;
#[cfg(feature = "codegen")]
pub use vellum_ir as ir;
