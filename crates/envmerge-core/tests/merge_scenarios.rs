use envmerge_core::{
    EnvironmentMerger, FolderPolicy, ItemListDocument, MergeStrategy, RESOURCES_DIR,
};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Two input environments and an output directory in a temp dir
struct EnvFixture {
    _temp_dir: TempDir,
    env1: PathBuf,
    env2: PathBuf,
    output: PathBuf,
}

impl EnvFixture {
    fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let env1 = temp_dir.path().join("env1");
        let env2 = temp_dir.path().join("env2");
        let output = temp_dir.path().join("merged");

        fs::create_dir_all(env1.join(RESOURCES_DIR)).expect("Failed to create env1");
        fs::create_dir_all(env2.join(RESOURCES_DIR)).expect("Failed to create env2");

        EnvFixture {
            _temp_dir: temp_dir,
            env1,
            env2,
            output,
        }
    }

    fn write_env1(&self, path: &str, content: &str) {
        write_file(&self.env1.join(RESOURCES_DIR).join(path), content);
    }

    fn write_env2(&self, path: &str, content: &str) {
        write_file(&self.env2.join(RESOURCES_DIR).join(path), content);
    }

    fn out(&self, path: &str) -> PathBuf {
        self.output.join(RESOURCES_DIR).join(path)
    }

    fn read_out(&self, path: &str) -> String {
        fs::read_to_string(self.out(path)).expect("Failed to read output file")
    }

    fn merge(&self) -> envmerge_core::MergeReport {
        self.merge_with(FolderPolicy::default())
    }

    fn merge_with(&self, policy: FolderPolicy) -> envmerge_core::MergeReport {
        EnvironmentMerger::new(policy)
            .merge(&self.env1, &self.env2, &self.output)
            .expect("Merge failed")
    }
}

fn write_file(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("Failed to create parent directories");
    }
    fs::write(path, content).expect("Failed to write file");
}

fn item_list(count: usize, tag: &str) -> String {
    let items: String = (0..count)
        .map(|i| format!("<{tag} id=\"{i}\"><Value>{tag}-{i}</Value></{tag}>"))
        .collect();
    format!("<Root><Items>{items}</Items></Root>")
}

#[test]
fn test_only_shared_folders_are_merged() {
    let fx = EnvFixture::new();
    fx.write_env1("Fonts/a.ttf", "a");
    fx.write_env2("Fonts/b.ttf", "b");
    fx.write_env1("OnlyInOne/x.txt", "x");
    fx.write_env2("OnlyInTwo/y.txt", "y");

    let report = fx.merge();

    assert!(fx.out("Fonts").is_dir());
    assert!(!fx.out("OnlyInOne").exists());
    assert!(!fx.out("OnlyInTwo").exists());
    assert_eq!(report.folders.len(), 1);
    assert_eq!(report.unmatched, vec!["OnlyInOne", "OnlyInTwo"]);
}

#[test]
fn test_folder_names_are_case_sensitive() {
    let fx = EnvFixture::new();
    fx.write_env1("Fonts/a.ttf", "a");
    fx.write_env2("fonts/a.ttf", "a");

    let report = fx.merge();

    assert!(report.folders.is_empty());
}

#[test]
fn test_fonts_scenario() {
    let fx = EnvFixture::new();
    fx.write_env1("Fonts/data.xml", &item_list(2, "Font"));
    fx.write_env1("Fonts/a.ttf", "env1 font");
    fx.write_env2("Fonts/data3.xml", &item_list(1, "Font"));
    fx.write_env2("Fonts/a.ttf", "env2 font");

    let report = fx.merge();

    let fonts = report.find_folder("Fonts").unwrap();
    assert_eq!(fonts.strategy, MergeStrategy::FileBased);
    assert_eq!(fonts.metadata_files, 2);
    assert_eq!(fx.read_out("Fonts/data.xml"), item_list(2, "Font"));
    assert_eq!(fx.read_out("Fonts/data0000002.xml"), item_list(1, "Font"));
    assert_eq!(fx.read_out("Fonts/a.ttf"), "env1 font");
    assert!(!fx.out("Fonts/data3.xml").exists());
}

#[test]
fn test_layers_scenario() {
    let fx = EnvFixture::new();
    fx.write_env1("Layers/data.xml", "<Layers><Items/></Layers>");
    fx.write_env2("Layers/data.xml", "<Layers></Layers>");

    let report = fx.merge();

    let layers = report.find_folder("Layers").unwrap();
    assert_eq!(layers.strategy, MergeStrategy::RecordBased);
    assert_eq!(layers.issues.len(), 1);
    assert!(layers.issues[0].0.starts_with(&fx.env2));

    let merged = ItemListDocument::load(fx.out("Layers/data.xml")).unwrap();
    assert_eq!(merged.item_count(), 0);
}

#[test]
fn test_record_items_sum() {
    let fx = EnvFixture::new();
    fx.write_env1("Materials/data.xml", &item_list(3, "A"));
    fx.write_env1("Materials/data0000002.xml", &item_list(2, "B"));
    fx.write_env2("Materials/data.xml", &item_list(4, "C"));
    fx.write_env2("Materials/texture.png", "not metadata");

    let report = fx.merge();

    let merged = ItemListDocument::load(fx.out("Materials/data.xml")).unwrap();
    assert_eq!(merged.item_count(), 9);
    assert_eq!(report.find_folder("Materials").unwrap().items_merged, 9);

    // env1 data.xml, env2 data.xml, env1 data0000002.xml
    let names: Vec<String> = merged.items().iter().filter_map(|i| i.name()).collect();
    assert_eq!(
        names,
        vec!["A", "A", "A", "C", "C", "C", "C", "B", "B"]
    );
    // Record-based folders only produce data.xml
    assert!(!fx.out("Materials/texture.png").exists());
    assert!(!fx.out("Materials/data0000002.xml").exists());
}

#[test]
fn test_nested_content_and_empty_dirs() {
    let fx = EnvFixture::new();
    fx.write_env1("Assets/textures/wood.png", "env1 wood");
    fx.write_env2("Assets/textures/wood.png", "env2 wood");
    fx.write_env2("Assets/textures/stone.png", "env2 stone");
    fs::create_dir_all(fx.env2.join(RESOURCES_DIR).join("Assets/empty")).unwrap();

    fx.merge();

    assert_eq!(fx.read_out("Assets/textures/wood.png"), "env1 wood");
    assert_eq!(fx.read_out("Assets/textures/stone.png"), "env2 stone");
    assert!(fx.out("Assets/empty").is_dir());
}

#[test]
fn test_rerun_is_idempotent_for_content() {
    let fx = EnvFixture::new();
    fx.write_env1("Documents/data.xml", "<D><I/></D>");
    fx.write_env1("Documents/report.pdf", "pdf");
    fx.write_env2("Documents/notes.txt", "notes");

    let first = fx.merge();
    assert_eq!(first.total_files_copied(), 2);

    let second = fx.merge();
    let docs = second.find_folder("Documents").unwrap();
    assert_eq!(docs.files_copied, 0);
    assert_eq!(docs.files_skipped, 2);
    assert_eq!(docs.metadata_files, 1);
    assert_eq!(fx.read_out("Documents/data.xml"), "<D><I/></D>");
}

#[test]
fn test_injected_policy() {
    let fx = EnvFixture::new();
    fx.write_env1("Fonts/data.xml", &item_list(1, "F"));
    fx.write_env2("Fonts/data.xml", &item_list(1, "F"));

    let policy = FolderPolicy::empty().with_fallback(MergeStrategy::RecordBased);
    let report = fx.merge_with(policy);

    assert_eq!(
        report.find_folder("Fonts").unwrap().strategy,
        MergeStrategy::RecordBased
    );
    let merged = ItemListDocument::load(fx.out("Fonts/data.xml")).unwrap();
    assert_eq!(merged.item_count(), 2);
    assert!(!fx.out("Fonts/data0000002.xml").exists());
}

#[test]
fn test_malformed_target_does_not_stop_other_folders() {
    let fx = EnvFixture::new();
    fx.write_env1("Layers/data.xml", "<Layers>");
    fx.write_env2("Layers/data.xml", &item_list(2, "Layer"));
    fx.write_env1("Fonts/data.xml", &item_list(1, "Font"));
    fx.write_env1("Fonts/a.ttf", "env1 font");
    fx.write_env2("Fonts/data2.xml", &item_list(1, "Font"));
    fx.write_env2("Fonts/b.ttf", "env2 font");

    let report = fx.merge();

    let layers = report.find_folder("Layers").unwrap();
    assert_eq!(layers.issues.len(), 1);
    assert!(layers.issues[0].0.starts_with(&fx.env1));
    assert_eq!(layers.items_merged, 0);
    assert!(!fx.out("Layers/data.xml").exists());

    let fonts = report.find_folder("Fonts").unwrap();
    assert!(fonts.is_clean());
    assert_eq!(fonts.metadata_files, 2);
    assert_eq!(fonts.files_copied, 2);
    assert_eq!(fx.read_out("Fonts/data0000002.xml"), item_list(1, "Font"));
    assert_eq!(fx.read_out("Fonts/a.ttf"), "env1 font");
    assert_eq!(fx.read_out("Fonts/b.ttf"), "env2 font");
    assert_eq!(report.total_issues(), 1);
}

#[test]
fn test_record_items_keep_their_namespaces() {
    let fx = EnvFixture::new();
    fx.write_env1(
        "Layers/data.xml",
        r#"<Layers xmlns:a="urn:a"><Items><a:Layer/></Items></Layers>"#,
    );
    fx.write_env2(
        "Layers/data.xml",
        r#"<Layers xmlns:b="urn:b"><Items><b:Layer/></Items></Layers>"#,
    );

    fx.merge();

    assert_eq!(
        fx.read_out("Layers/data.xml"),
        r#"<Layers xmlns:a="urn:a"><Items><a:Layer/><b:Layer xmlns:b="urn:b"/></Items></Layers>"#
    );
}
