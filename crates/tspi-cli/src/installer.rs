//! One installer run.
//!
//! The run reads `tspi.json` and `package.json`, wraps the main declaration in
//! an ambient module, copies secondary declarations next to it and hauls the
//! package's TSD manifest into the depending package's manifest. Every file
//! access goes through the [`FileSystem`] the installer was built with, so a
//! dry run is the same run over a [`tspi_dts::DryRun`] filesystem.

use crate::errors::InstallError;
use rayon::prelude::*;
use std::io;
use std::path::{Path, PathBuf};
use tspi_config::{Config, PackageConfig};
use tspi_dts::layout::{self, ExportLocation, InstallMode};
use tspi_dts::secondary::{rewrite_secondary_declaration, secondary_destination};
use tspi_dts::{
    DeclarationDocument, DeclarationWrapper, FileSystem, LexicalResolver, PathResolver,
    ReferencePathRewriter, RewriteSettings,
};
use tspi_logger::Logger;
use tspi_manifest::Manifest;

/// Settings taken from the command line
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallOptions {
    /// `None` means the default `tspi.json`, which may be absent
    pub config_file: Option<PathBuf>,
    pub dry_run: bool,
    pub self_install: bool,
}

/// What happened to the exported TSD manifest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ManifestOutcome {
    /// The package has no TSD manifest of its own
    #[default]
    NoLocalManifest,
    /// The exported manifest did not exist and was created from ours
    Created,
    /// Our typings were merged into an existing exported manifest
    Merged { added: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct InstallReport {
    pub package_name: String,
    pub main_declaration: PathBuf,
    pub secondary_declarations: Vec<PathBuf>,
    pub manifest: ManifestOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallOutcome {
    /// Not installed as a dependency, and neither forced nor self-installing
    Skipped,
    Installed(InstallReport),
}

pub struct Installer<F> {
    fs: F,
    resolver: LexicalResolver,
    logger: Logger,
    options: InstallOptions,
}

impl<F: FileSystem> Installer<F> {
    /// `resolver` must resolve relative paths the same way `fs` does.
    pub fn new(fs: F, resolver: LexicalResolver, logger: Logger, options: InstallOptions) -> Self {
        Self {
            fs,
            resolver,
            logger,
            options,
        }
    }

    pub fn into_filesystem(self) -> F {
        self.fs
    }

    pub fn install(&self) -> Result<InstallOutcome, InstallError> {
        let config = Config::load(&self.fs, self.options.config_file.as_deref())?;
        let mode = InstallMode::from_self_install(self.options.self_install);

        if !self.should_run(mode, config.force) {
            return Ok(InstallOutcome::Skipped);
        }

        let package = PackageConfig::load(&self.fs, &config.package_config_path())?;
        if package.is_scoped() {
            self.logger
                .debug(&format!("Scoped package: {}", package.name));
        }

        let typings_subdir = config.typings_subdir_or(&package.name);
        let location = ExportLocation::resolve(
            &package.name,
            typings_subdir,
            mode,
            config.exported_typings_dir.as_deref(),
            config.exported_tsd_config.as_deref(),
        );
        self.logger.step(&format!(
            "Exported typings subdirectory: {}",
            location.typings_subdir.display()
        ));

        let main_declaration = config
            .main_declaration
            .clone()
            .unwrap_or_else(|| package.main_declaration());
        let main_declaration_dir = self.parent_dir(&main_declaration);
        let local_typings_dir = config.local_typings_dir();
        let rewriter = ReferencePathRewriter::new(
            &self.resolver,
            &RewriteSettings {
                main_declaration_dir: &main_declaration_dir,
                local_typings_dir: &local_typings_dir,
                typings_subdir,
                secondary_declarations: &config.secondary_declarations,
            },
        );

        let wrapped = self.wrap_main_declaration(
            &main_declaration,
            &rewriter,
            config.module_name_or(&package.name),
            config.no_wrap,
        )?;
        let exported_main = self.write_main_declaration(&main_declaration, &location, &wrapped)?;
        let secondary_declarations = self.copy_secondary_declarations(
            &config.secondary_declarations,
            &main_declaration_dir,
            &location,
            &rewriter,
        )?;
        let manifest = self.haul_typings(&config, &location)?;

        Ok(InstallOutcome::Installed(InstallReport {
            package_name: package.name,
            main_declaration: exported_main,
            secondary_declarations,
            manifest,
        }))
    }

    fn should_run(&self, mode: InstallMode, force: bool) -> bool {
        if mode == InstallMode::SelfInstall {
            self.logger.debug("Self-install: always running");
        } else if force {
            self.logger.debug("Forced to run");
        }
        let cwd = self.resolver.cwd();
        let run = layout::should_run(cwd, mode, force);
        if !run {
            self.logger.info(&format!(
                "Not installed under node_modules, skipping: {}",
                cwd.display()
            ));
        }
        run
    }

    fn parent_dir(&self, path: &Path) -> PathBuf {
        self.resolver
            .absolute(path)
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.resolver.cwd().to_path_buf())
    }

    fn wrap_main_declaration(
        &self,
        main_declaration: &Path,
        rewriter: &ReferencePathRewriter<'_>,
        module_name: &str,
        no_wrap: bool,
    ) -> Result<String, InstallError> {
        self.logger.debug(&format!(
            "Reading main declaration file: {}",
            main_declaration.display()
        ));
        let text = self.fs.read_text(main_declaration).map_err(|e| {
            InstallError::DeclarationWrap(format!("{}: {}", main_declaration.display(), e))
        })?;

        let document = DeclarationDocument::new(&text, rewriter.main_declaration_dir());
        Ok(DeclarationWrapper::new(rewriter, module_name, no_wrap).wrap(&document))
    }

    fn write_main_declaration(
        &self,
        main_declaration: &Path,
        location: &ExportLocation,
        contents: &str,
    ) -> Result<PathBuf, InstallError> {
        let file_name = main_declaration.file_name().ok_or_else(|| {
            InstallError::DeclarationWrap(format!(
                "{}: not a file path",
                main_declaration.display()
            ))
        })?;

        self.fs
            .create_dir_all(&location.typings_subdir)
            .map_err(InstallError::io(&location.typings_subdir))?;
        self.log_location("Exported typings directory", &location.typings_subdir);

        let destination = location.typings_subdir.join(file_name);
        self.fs
            .write_text(&destination, contents)
            .map_err(InstallError::io(&destination))?;
        self.log_location("Exported main declaration", &destination);
        Ok(destination)
    }

    /// Copies run in parallel; the first failure is reported with its file.
    fn copy_secondary_declarations(
        &self,
        secondary_declarations: &[PathBuf],
        main_declaration_dir: &Path,
        location: &ExportLocation,
        rewriter: &ReferencePathRewriter<'_>,
    ) -> Result<Vec<PathBuf>, InstallError> {
        secondary_declarations
            .par_iter()
            .map(|secondary| {
                self.copy_secondary_declaration(
                    secondary,
                    main_declaration_dir,
                    location,
                    rewriter,
                )
                .map_err(|e| InstallError::SecondaryDeclaration {
                    path: secondary.clone(),
                    message: e.to_string(),
                })
            })
            .collect()
    }

    fn copy_secondary_declaration(
        &self,
        secondary: &Path,
        main_declaration_dir: &Path,
        location: &ExportLocation,
        rewriter: &ReferencePathRewriter<'_>,
    ) -> io::Result<PathBuf> {
        let absolute = self.resolver.absolute(secondary);
        let text = self.fs.read_text(secondary)?;
        let rewritten = rewrite_secondary_declaration(&text, &self.parent_dir(&absolute), rewriter);

        let destination =
            secondary_destination(main_declaration_dir, &absolute, &location.typings_subdir);
        if let Some(parent) = destination.parent() {
            self.fs.create_dir_all(parent)?;
        }
        self.fs.write_text(&destination, &rewritten)?;
        self.log_location("Exported secondary declaration", &destination);
        Ok(destination)
    }

    /// Merge the package's TSD manifest into the exported one
    fn haul_typings(
        &self,
        config: &Config,
        location: &ExportLocation,
    ) -> Result<ManifestOutcome, InstallError> {
        let local_path = config.local_tsd_config_path();
        let Some(local) = self.read_manifest(&local_path)? else {
            self.logger.debug(&format!(
                "No TSD config file to haul: {}",
                local_path.display()
            ));
            return Ok(ManifestOutcome::NoLocalManifest);
        };

        let (exported, outcome) = match self.read_manifest(&location.manifest_path)? {
            Some(mut exported) => {
                let added = exported.incorporate(&local);
                self.logger.debug(&format!(
                    "Incorporated {} typings into {}",
                    added,
                    location.manifest_path.display()
                ));
                (exported, ManifestOutcome::Merged { added })
            }
            None => {
                let mut exported = local;
                exported.set_path(location.manifest_typings_path(&self.resolver));
                (exported, ManifestOutcome::Created)
            }
        };

        let contents = exported
            .to_json_string()
            .map_err(|source| InstallError::Manifest {
                path: location.manifest_path.clone(),
                source,
            })?;
        self.fs
            .write_text(&location.manifest_path, &contents)
            .map_err(InstallError::io(&location.manifest_path))?;
        self.log_location("Exported TSD config", &location.manifest_path);
        Ok(outcome)
    }

    fn read_manifest(&self, path: &Path) -> Result<Option<Manifest>, InstallError> {
        let Some(contents) = self
            .fs
            .read_optional(path)
            .map_err(InstallError::io(path))?
        else {
            return Ok(None);
        };
        Manifest::parse(&contents)
            .map(Some)
            .map_err(|source| InstallError::Manifest {
                path: path.to_path_buf(),
                source,
            })
    }

    /// Log where `path` really is; dry runs fall back to the lexical location.
    fn log_location(&self, label: &str, path: &Path) {
        let shown = self
            .fs
            .real_path(path)
            .unwrap_or_else(|_| self.resolver.absolute(path));
        self.logger
            .debug(&format!("{}: {}", label, shown.display()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tspi_dts::{DryRun, MemoryFs};
    use tspi_manifest::InstalledTyping;

    const PACKAGE: &str = r#"{"name": "widgets", "main": "index.js"}"#;
    const MAIN: &str = "/// <reference path=\"foo.d.ts\"/>\n\ndeclare function main(): void;\n";

    const LOCAL_MANIFEST: &str = r#"{
  "version": "v4",
  "repo": "borisyankov/DefinitelyTyped",
  "ref": "master",
  "path": "typings",
  "installed": {
    "node/node.d.ts": { "commit": "new" },
    "bluebird/bluebird.d.ts": { "commit": "abc" }
  }
}"#;

    fn installer<F: FileSystem>(fs: F, cwd: &str, options: InstallOptions) -> Installer<F> {
        Installer::new(fs, LexicalResolver::new(cwd), Logger::default(), options)
    }

    fn dependency_fs() -> MemoryFs {
        MemoryFs::new("/app/node_modules/widgets")
            .with_file("package.json", PACKAGE)
            .with_file("index.d.ts", MAIN)
    }

    fn run(fs: MemoryFs, cwd: &str, options: InstallOptions) -> (MemoryFs, InstallOutcome) {
        let installer = installer(fs, cwd, options);
        let outcome = installer.install();
        assert!(outcome.is_ok(), "install failed: {:?}", outcome.as_ref().err());
        let outcome = outcome.unwrap_or(InstallOutcome::Skipped);
        (installer.into_filesystem(), outcome)
    }

    fn report(outcome: InstallOutcome) -> InstallReport {
        assert!(
            matches!(outcome, InstallOutcome::Installed(_)),
            "expected the installer to run"
        );
        match outcome {
            InstallOutcome::Installed(report) => report,
            InstallOutcome::Skipped => InstallReport::default(),
        }
    }

    #[test]
    fn test_wraps_main_declaration_into_dependent_typings() {
        let (fs, outcome) = run(
            dependency_fs(),
            "/app/node_modules/widgets",
            InstallOptions::default(),
        );

        let report = report(outcome);
        assert_eq!(report.package_name, "widgets");
        assert_eq!(
            report.main_declaration,
            PathBuf::from("../../typings/widgets/index.d.ts")
        );
        assert_eq!(report.manifest, ManifestOutcome::NoLocalManifest);
        assert_eq!(
            fs.file("/app/typings/widgets/index.d.ts").as_deref(),
            Some(
                "/// <reference path=\"../../foo.d.ts\" />\n\
                 declare module 'widgets' {\n\
                 function main(): void;\n\
                 }\n"
            )
        );
    }

    #[test]
    fn test_no_wrap_leaves_declarations_alone() {
        let fs = dependency_fs()
            .with_file("package.json", r#"{"name": "no-wrap"}"#)
            .with_file("tspi.json", r#"{"noWrap": true}"#);
        let (fs, _) = run(fs, "/app/node_modules/widgets", InstallOptions::default());

        assert_eq!(
            fs.file("/app/typings/no-wrap/index.d.ts").as_deref(),
            Some("/// <reference path=\"../../foo.d.ts\" />\ndeclare function main(): void;\n")
        );
    }

    #[test]
    fn test_bundled_declaration_dependencies_are_rewritten() {
        let bundle = "\
// Generated by dts-bundle v0.3.0
// Dependencies for this module:
//   typings/bluebird/bluebird.d.ts

declare module 'use-dts-bundle' {
    export function hello(): string;
}
";
        let fs = dependency_fs()
            .with_file("package.json", r#"{"name": "use-dts-bundle"}"#)
            .with_file("index.d.ts", bundle)
            .with_file("tspi.json", r#"{"noWrap": true}"#);
        let (fs, _) = run(fs, "/app/node_modules/widgets", InstallOptions::default());

        assert_eq!(
            fs.file("/app/typings/use-dts-bundle/index.d.ts").as_deref(),
            Some(
                "// Generated by dts-bundle v0.3.0\n\
                 // Dependencies for this module:\n\
                 /// <reference path=\"../bluebird/bluebird.d.ts\" />\n\
                 declare module 'use-dts-bundle' {\n\
                 \x20   export function hello(): string;\n\
                 }\n"
            )
        );
    }

    #[test]
    fn test_module_name_and_main_declaration_from_config() {
        let fs = dependency_fs()
            .with_file(
                "tspi.json",
                r#"{"mainDeclaration": "lib/api.d.ts", "moduleName": "gadgets"}"#,
            )
            .with_file("lib/api.d.ts", "export declare class Gadget {}\n");
        let (fs, outcome) = run(fs, "/app/node_modules/widgets", InstallOptions::default());

        assert_eq!(
            report(outcome).main_declaration,
            PathBuf::from("../../typings/widgets/api.d.ts")
        );
        assert_eq!(
            fs.file("/app/typings/widgets/api.d.ts").as_deref(),
            Some("declare module 'gadgets' {\nexport class Gadget {}\n}\n")
        );
    }

    #[test]
    fn test_main_declaration_follows_package_main() {
        let fs = MemoryFs::new("/app/node_modules/widgets")
            .with_file("package.json", r#"{"name": "widgets", "main": "lib/index.js"}"#)
            .with_file("lib/index.d.ts", "declare var version: string;\n");
        let (fs, _) = run(fs, "/app/node_modules/widgets", InstallOptions::default());

        assert_eq!(
            fs.file("/app/typings/widgets/index.d.ts").as_deref(),
            Some("declare module 'widgets' {\nvar version: string;\n}\n")
        );
    }

    #[test]
    fn test_scoped_package_goes_one_level_higher() {
        let fs = MemoryFs::new("/app/node_modules/@scope/foo")
            .with_file("package.json", r#"{"name": "@scope/foo"}"#)
            .with_file("index.d.ts", "declare function foo(): void;\n")
            .with_file("tsd.json", LOCAL_MANIFEST);
        let (fs, outcome) = run(fs, "/app/node_modules/@scope/foo", InstallOptions::default());

        assert_eq!(report(outcome).manifest, ManifestOutcome::Created);
        assert_eq!(
            fs.file("/app/typings/@scope/foo/index.d.ts").as_deref(),
            Some("declare module '@scope/foo' {\nfunction foo(): void;\n}\n")
        );
        let exported = fs.file("/app/node_modules/tsd.json").unwrap_or_default();
        assert!(Manifest::parse(&exported).is_ok_and(|m| m.path.as_deref() == Some("../typings")));
    }

    #[test]
    fn test_skips_outside_node_modules() {
        let fs = MemoryFs::new("/src/widgets")
            .with_file("package.json", PACKAGE)
            .with_file("index.d.ts", MAIN);
        let before = fs.file_paths();
        let (fs, outcome) = run(fs, "/src/widgets", InstallOptions::default());

        assert_eq!(outcome, InstallOutcome::Skipped);
        assert_eq!(fs.file_paths(), before);
    }

    #[test]
    fn test_force_overrides_the_gate() {
        let fs = MemoryFs::new("/src/widgets")
            .with_file("package.json", PACKAGE)
            .with_file("index.d.ts", MAIN)
            .with_file("tspi.json", r#"{"force": true}"#);
        let (fs, outcome) = run(fs, "/src/widgets", InstallOptions::default());

        assert!(matches!(outcome, InstallOutcome::Installed(_)));
        assert!(fs.file("/typings/widgets/index.d.ts").is_some());
    }

    #[test]
    fn test_self_install_exports_into_own_typings() {
        let fs = MemoryFs::new("/src/widgets")
            .with_file("package.json", PACKAGE)
            .with_file("index.d.ts", MAIN)
            .with_file("tsd.json", LOCAL_MANIFEST);
        let options = InstallOptions {
            self_install: true,
            ..InstallOptions::default()
        };
        let (fs, outcome) = run(fs, "/src/widgets", options);

        assert_eq!(report(outcome).manifest, ManifestOutcome::Created);
        assert!(fs.file("/src/widgets/typings/widgets/index.d.ts").is_some());
        assert!(fs.file("/src/widgets/typings/tsd.json").is_some());
    }

    #[test]
    fn test_dry_run_computes_everything_and_writes_nothing() {
        let fs = dependency_fs().with_file("tsd.json", LOCAL_MANIFEST);
        let before = fs.file_paths();

        let dry = installer(
            DryRun::new(fs),
            "/app/node_modules/widgets",
            InstallOptions {
                dry_run: true,
                ..InstallOptions::default()
            },
        );
        let dry_outcome = dry.install();
        let fs = dry.into_filesystem().into_inner();
        assert_eq!(fs.file_paths(), before);

        let (_, real_outcome) = run(fs, "/app/node_modules/widgets", InstallOptions::default());
        assert!(dry_outcome.is_ok_and(|o| o == real_outcome));
    }

    #[test]
    fn test_secondary_declarations_keep_their_layout() {
        let fs = dependency_fs()
            .with_file(
                "index.d.ts",
                "/// <reference path=\"lib/util.d.ts\"/>\ndeclare function main(): void;\n",
            )
            .with_file(
                "lib/util.d.ts",
                "/// <reference path=\"../typings/node/node.d.ts\"/>\n\ndeclare function util(): void;\n",
            )
            .with_file("tspi.json", r#"{"secondaryDeclarations": ["lib/util.d.ts"]}"#);
        let (fs, outcome) = run(fs, "/app/node_modules/widgets", InstallOptions::default());

        assert_eq!(
            report(outcome).secondary_declarations,
            vec![PathBuf::from("../../typings/widgets/lib/util.d.ts")]
        );
        assert_eq!(
            fs.file("/app/typings/widgets/index.d.ts").as_deref(),
            Some(
                "/// <reference path=\"lib/util.d.ts\" />\n\
                 declare module 'widgets' {\n\
                 function main(): void;\n\
                 }\n"
            )
        );
        assert_eq!(
            fs.file("/app/typings/widgets/lib/util.d.ts").as_deref(),
            Some(
                "/// <reference path=\"../../node/node.d.ts\" />\n\
                 \n\
                 declare function util(): void;\n"
            )
        );
    }

    #[test]
    fn test_missing_secondary_declaration_is_named() {
        let fs = dependency_fs()
            .with_file("tspi.json", r#"{"secondaryDeclarations": ["lib/missing.d.ts"]}"#);
        let result = installer(fs, "/app/node_modules/widgets", InstallOptions::default()).install();

        assert!(matches!(
            result,
            Err(InstallError::SecondaryDeclaration { ref path, .. })
                if path == Path::new("lib/missing.d.ts")
        ));
    }

    #[test]
    fn test_missing_main_declaration() {
        let fs = MemoryFs::new("/app/node_modules/widgets").with_file("package.json", PACKAGE);
        let result = installer(fs, "/app/node_modules/widgets", InstallOptions::default()).install();

        assert!(matches!(result, Err(InstallError::DeclarationWrap(_))));
    }

    #[test]
    fn test_missing_package_config() {
        let fs = MemoryFs::new("/app/node_modules/widgets").with_file("index.d.ts", MAIN);
        let result = installer(fs, "/app/node_modules/widgets", InstallOptions::default()).install();

        assert!(matches!(result, Err(InstallError::PackageMetadata(_))));
    }

    #[test]
    fn test_missing_explicit_config_file() {
        let options = InstallOptions {
            config_file: Some(PathBuf::from("custom.json")),
            ..InstallOptions::default()
        };
        let result = installer(dependency_fs(), "/app/node_modules/widgets", options).install();

        assert!(matches!(result, Err(InstallError::Config(_))));
    }

    #[test]
    fn test_manifest_is_created_from_local() {
        let fs = dependency_fs().with_file("tsd.json", LOCAL_MANIFEST);
        let (fs, outcome) = run(fs, "/app/node_modules/widgets", InstallOptions::default());

        assert_eq!(report(outcome).manifest, ManifestOutcome::Created);
        let exported = fs.file("/app/node_modules/tsd.json").unwrap_or_default();
        assert!(exported.ends_with("}\n"));
        assert!(exported.contains("\n  \"version\": \"v4\""));

        let parsed = Manifest::parse(&exported);
        assert!(parsed.is_ok());
        let manifest = parsed.unwrap_or_default();
        assert_eq!(manifest.path.as_deref(), Some("../typings"));
        assert_eq!(manifest.installed.len(), 2);
    }

    #[test]
    fn test_manifest_is_merged_into_existing() {
        let existing = r#"{
  "path": "../typings",
  "installed": { "node/node.d.ts": { "commit": "old" } }
}"#;
        let fs = dependency_fs()
            .with_file("tsd.json", LOCAL_MANIFEST)
            .with_file("/app/node_modules/tsd.json", existing);
        let (fs, outcome) = run(fs, "/app/node_modules/widgets", InstallOptions::default());

        assert_eq!(report(outcome).manifest, ManifestOutcome::Merged { added: 1 });
        let manifest =
            Manifest::parse(&fs.file("/app/node_modules/tsd.json").unwrap_or_default())
                .unwrap_or_default();
        assert_eq!(
            manifest.installed.get("node/node.d.ts"),
            Some(&InstalledTyping {
                commit: Some("old".to_string()),
                ..InstalledTyping::default()
            })
        );
        assert!(manifest.installed.contains_key("bluebird/bluebird.d.ts"));
        assert_eq!(manifest.version, None);
    }

    #[test]
    fn test_unreadable_exported_manifest_is_an_error() {
        let fs = dependency_fs()
            .with_file("tsd.json", LOCAL_MANIFEST)
            .with_file("/app/node_modules/tsd.json", "{ broken");
        let result = installer(fs, "/app/node_modules/widgets", InstallOptions::default()).install();

        assert!(matches!(result, Err(InstallError::Manifest { .. })));
    }

    #[test]
    fn test_second_run_is_stable() {
        let fs = dependency_fs().with_file("tsd.json", LOCAL_MANIFEST);
        let (fs, first) = run(fs, "/app/node_modules/widgets", InstallOptions::default());
        let exported_main = fs.file("/app/typings/widgets/index.d.ts");
        let exported_manifest = fs.file("/app/node_modules/tsd.json");

        let (fs, second) = run(fs, "/app/node_modules/widgets", InstallOptions::default());
        assert_eq!(report(first).manifest, ManifestOutcome::Created);
        assert_eq!(report(second).manifest, ManifestOutcome::Merged { added: 0 });
        assert_eq!(fs.file("/app/typings/widgets/index.d.ts"), exported_main);
        assert_eq!(fs.file("/app/node_modules/tsd.json"), exported_manifest);
    }
}
