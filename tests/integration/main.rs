//! Integration tests for crossnpm

mod cli_tests {
    use assert_cmd::Command;
    use predicates::prelude::*;

    fn crossnpm() -> Command {
        Command::cargo_bin("crossnpm").unwrap()
    }

    #[test]
    fn help_displays() {
        crossnpm()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("Offline npm staging"));
    }

    #[test]
    fn version_displays() {
        crossnpm()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("crossnpm"));
    }

    #[test]
    fn arch_maps_supported_matrix() {
        for (target, expected) in [
            ("x86_64", "x64"),
            ("i686", "ia32"),
            ("ppc64", "ppc"),
            ("powerpc", "ppc"),
            ("arm64", "arm"),
        ] {
            crossnpm()
                .args(["arch", target])
                .assert()
                .success()
                .stdout(predicate::str::diff(format!("{expected}\n")));
        }
    }

    #[test]
    fn arch_identity_for_unmapped() {
        crossnpm()
            .args(["arch", "aarch64"])
            .assert()
            .success()
            .stdout(predicate::str::diff("aarch64\n"));
    }

    #[test]
    fn config_path() {
        crossnpm()
            .args(["--no-local", "config", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains("config.toml"));
    }

    #[test]
    fn config_show() {
        crossnpm()
            .args(["--no-local", "config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[registry]"));
    }

    #[test]
    fn fetch_fails_without_manifest() {
        let dir = tempfile::tempdir().unwrap();
        crossnpm()
            .current_dir(dir.path())
            .args(["--no-local", "fetch", "--source", "."])
            .assert()
            .failure()
            .stderr(predicate::str::contains("No npm lock manifest"));
    }

    #[test]
    fn build_fails_without_manifest_before_any_work() {
        let dir = tempfile::tempdir().unwrap();
        crossnpm()
            .current_dir(dir.path())
            .args([
                "--no-local",
                "build",
                "--source",
                ".",
                "--prefix",
                "out",
                "--target-arch",
                "x86_64",
            ])
            .assert()
            .failure()
            .stderr(predicate::str::contains("No npm lock manifest"));
        assert!(!dir.path().join("out").exists());
    }

    #[test]
    fn install_requires_target_arch() {
        crossnpm()
            .args(["install", "--install-root", "/tmp/root"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("--target-arch"));
    }
}

mod partition_tests {
    use assert_cmd::Command;
    use predicates::prelude::*;
    use std::fs;
    use std::path::{Path, PathBuf};

    fn crossnpm() -> Command {
        Command::cargo_bin("crossnpm").unwrap()
    }

    fn touch(path: PathBuf) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"x").unwrap();
    }

    /// Lay out an install root the way a global offline install leaves it
    fn fake_install_root(root: &Path) {
        let modules = root.join("lib/node_modules");
        touch(modules.join("app/index.js"));
        touch(modules.join("app/package-lock.json"));
        touch(modules.join("@scope/util/index.js"));
        touch(modules.join("@scope/util/npm-shrinkwrap.json"));

        let addon = modules.join("app/node_modules/bcrypt");
        touch(addon.join("build/Release/bcrypt.node"));
        touch(addon.join("build/Release/obj.target/bcrypt.o"));
        touch(addon.join("build/Debug/bcrypt.node"));

        // build/ without node-gyp output is plain package content
        touch(modules.join("app/node_modules/tslib/build/tslib.js"));

        fs::create_dir_all(root.join("bin")).unwrap();
        #[cfg(unix)]
        std::os::unix::fs::symlink("../lib/node_modules/app/index.js", root.join("bin/app"))
            .unwrap();
    }

    #[test]
    fn partition_produces_final_layout() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("staging");
        let prefix = dir.path().join("out");
        fake_install_root(&root);

        crossnpm()
            .args([
                "--no-local",
                "partition",
                root.to_str().unwrap(),
                prefix.to_str().unwrap(),
            ])
            .assert()
            .success()
            .stdout(predicate::str::contains("1 native addons"));

        let modules = prefix.join("lib/node_modules");
        assert!(modules.join("app/index.js").is_file());
        assert!(modules
            .join("app/node_modules/bcrypt/build/Release/bcrypt.node")
            .is_file());
        assert!(modules
            .join("app/node_modules/tslib/build/tslib.js")
            .is_file());

        // Intermediates and nested lock manifests never ship
        assert!(!modules.join("app/node_modules/bcrypt/build/Debug").exists());
        assert!(!modules
            .join("app/node_modules/bcrypt/build/Release/obj.target")
            .exists());
        assert!(!modules.join("app/package-lock.json").exists());
        assert!(!modules.join("@scope/util/npm-shrinkwrap.json").exists());

        // Compatibility alias and executables
        #[cfg(unix)]
        {
            assert_eq!(
                fs::read_link(prefix.join("lib/node")).unwrap(),
                PathBuf::from("node_modules")
            );
            assert!(prefix.join("bin/app").symlink_metadata().is_ok());
        }
    }

    #[test]
    fn partition_without_executables_succeeds() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("staging");
        let prefix = dir.path().join("out");
        touch(root.join("lib/node_modules/app/index.js"));

        crossnpm()
            .args([
                "--no-local",
                "partition",
                root.to_str().unwrap(),
                prefix.to_str().unwrap(),
            ])
            .assert()
            .success();

        assert!(!prefix.join("bin").exists());
    }

    #[test]
    fn partition_missing_root_fails() {
        let dir = tempfile::tempdir().unwrap();
        crossnpm()
            .args([
                "--no-local",
                "partition",
                dir.path().join("nope").to_str().unwrap(),
                dir.path().join("out").to_str().unwrap(),
            ])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Path not found"));
    }
}
