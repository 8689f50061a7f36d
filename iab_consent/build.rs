use proc_macro2::{Ident, Span, TokenStream};
use quote::quote;
use std::collections::BTreeMap;
use std::error::Error;
use std::path::{Path, PathBuf};
use std::{env, fs};
use walkdir::WalkDir;

const DATA_DIR: &str = "tests/data";
const OUTPUT_FILE: &str = "consent_string_tests.rs";

fn main() -> Result<(), Box<dyn Error>> {
    println!("cargo:rerun-if-changed={DATA_DIR}");

    let modules = consent_strings_by_version()
        .iter()
        .map(|(version, files)| version_module(version, files))
        .collect::<Vec<_>>();
    let syntax_tree = syn::parse2(quote! { #(#modules)* })?;

    let out_dir = env::var("OUT_DIR")?;
    fs::write(
        Path::new(&out_dir).join(OUTPUT_FILE),
        prettyplease::unparse(&syntax_tree),
    )?;

    Ok(())
}

/// Groups the JSON files found under `DATA_DIR/<version>/` by version directory.
fn consent_strings_by_version() -> BTreeMap<String, Vec<PathBuf>> {
    let mut versions = BTreeMap::<String, Vec<PathBuf>>::new();

    let files = WalkDir::new(DATA_DIR)
        .min_depth(2)
        .max_depth(2)
        .sort_by_file_name()
        .into_iter()
        .flatten()
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "json"));

    for path in files {
        let version = path
            .parent()
            .and_then(Path::file_name)
            .and_then(|name| name.to_str());
        if let Some(version) = version {
            versions.entry(version.to_string()).or_default().push(path);
        }
    }

    versions
}

/// One module per version, checking each string both decodes to its expected JSON and
/// decodes to the same consent once re-encoded.
fn version_module(version: &str, files: &[PathBuf]) -> TokenStream {
    let module = Ident::new(version, Span::call_site());
    let cases = files
        .iter()
        .filter_map(|path| {
            let filename = path.to_str()?;
            let name = path.file_stem()?.to_str()?.replace('_', " ");
            Some(quote! { #[test_case(#filename ; #name)] })
        })
        .collect::<Vec<_>>();

    quote! {
        mod #module {
            use crate::common::ConsentStringFile;
            use test_case::test_case;

            #(#cases)*
            fn decodes_to_expected_json(filename: &str) {
                ConsentStringFile::load(filename).unwrap().assert_json_matches();
            }

            #(#cases)*
            fn reencoding_keeps_consent(filename: &str) {
                ConsentStringFile::load(filename).unwrap().assert_reencoding_keeps_consent();
            }
        }
    }
}
