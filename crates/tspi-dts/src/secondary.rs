//! Secondary declarations are copied as they are, except that their
//! reference directives are rewritten the same way as the main declaration's.

use crate::reference::{ReferencePathRewriter, Recognizer};
use std::path::{Path, PathBuf};

/// Rewrite every reference directive in `text`, keeping all other lines
/// (blank ones included) byte for byte.
pub fn rewrite_secondary_declaration(
    text: &str,
    source_dir: &Path,
    rewriter: &ReferencePathRewriter<'_>,
) -> String {
    text.split('\n')
        .map(|line| {
            let content = line.strip_suffix('\r').unwrap_or(line);
            match Recognizer::Standard.reference_path(content) {
                Some(path) => rewriter.rewrite(path, source_dir),
                None => line.to_string(),
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Where a secondary declaration lands: its position relative to the main
/// declaration's directory, below the exported typings subdirectory
pub fn secondary_destination(
    main_declaration_dir: &Path,
    secondary_absolute: &Path,
    exported_typings_subdir: &Path,
) -> PathBuf {
    exported_typings_subdir.join(crate::paths::relative(
        main_declaration_dir,
        secondary_absolute,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paths::LexicalResolver;
    use crate::reference::RewriteSettings;

    #[test]
    fn test_only_directives_change() {
        let resolver = LexicalResolver::new("/pkg");
        let secondary = vec![PathBuf::from("/pkg/lib/foo.d.ts")];
        let rewriter = ReferencePathRewriter::new(
            &resolver,
            &RewriteSettings {
                main_declaration_dir: Path::new("/pkg"),
                local_typings_dir: Path::new("typings"),
                typings_subdir: "widgets",
                secondary_declarations: &secondary,
            },
        );

        let input = "/// <reference path=\"../typings/node/node.d.ts\"/>\r\n\
                     /// <reference path=\"foo.d.ts\"/>\n\
                     \n\
                     declare function util(): void;\n";
        let output = rewrite_secondary_declaration(input, Path::new("/pkg/lib"), &rewriter);
        assert_eq!(
            output,
            "/// <reference path=\"../../node/node.d.ts\" />\n\
             /// <reference path=\"foo.d.ts\" />\n\
             \n\
             declare function util(): void;\n"
        );
    }

    #[test]
    fn test_secondary_destination() {
        assert_eq!(
            secondary_destination(
                Path::new("/pkg"),
                Path::new("/pkg/lib/foo.d.ts"),
                Path::new("../../typings/widgets"),
            ),
            PathBuf::from("../../typings/widgets/lib/foo.d.ts")
        );
    }
}
