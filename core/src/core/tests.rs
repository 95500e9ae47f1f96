use super::*;
use tempfile::TempDir;

mod common {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;

    pub(super) fn create_test_core() -> (ProcLabCore<JsonStore>, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let config = Config::new(temp_dir.path().join("share"));
        let core = ProcLabCore::open_json(config).unwrap();
        (core, temp_dir)
    }

    pub(super) fn create_test_db_core() -> (ProcLabCore<DbStore>, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let config = Config::new(temp_dir.path().join("share"));
        let core = ProcLabCore::open_db(config).unwrap();
        (core, temp_dir)
    }

    pub(super) fn make_test(s: &str) -> TestName {
        TestName::try_from(s).unwrap()
    }

    pub(super) fn create_test_file(dir: &TempDir, name: &str, content: &[u8]) -> PathBuf {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(content).unwrap();
        path
    }

    pub(super) fn texts(procedures: &[Procedure]) -> Vec<&str> {
        procedures.iter().map(|p| p.text.as_str()).collect()
    }
}

mod add_test {
    use super::common::{create_test_core, create_test_db_core, make_test};
    use super::*;

    #[test]
    fn test_add_creates_empty_procedure_list() {
        let (mut core, temp) = create_test_core();

        assert!(core.add_test("HAST").unwrap());

        assert_eq!(core.tests().unwrap(), vec![make_test("HAST")]);
        let proc_file = temp
            .path()
            .join("share")
            .join("TestProcedures")
            .join("HAST_procedures.json");
        assert_eq!(std::fs::read_to_string(proc_file).unwrap(), "[]");
    }

    #[test]
    fn test_add_blank_name_is_noop() {
        let (mut core, temp) = create_test_core();

        assert!(!core.add_test("").unwrap());
        assert!(!core.add_test("   ").unwrap());

        assert!(core.tests().unwrap().is_empty());
        assert!(!temp.path().join("share").join("tests.json").exists());
    }

    #[test]
    fn test_add_invalid_name_is_error() {
        let (mut core, _temp) = create_test_core();

        let result = core.add_test("a/b");
        assert!(matches!(result, Err(ProcLabError::InvalidTestName(_))));
    }

    #[test]
    fn test_add_duplicate_keeps_existing_procedures() {
        let (mut core, _temp) = create_test_core();
        let test = make_test("HAST");
        core.add_test("HAST").unwrap();
        core.add_procedure(&test, "Step1", Link::None).unwrap();

        assert!(!core.add_test("HAST").unwrap());
        assert!(!core.add_test(" HAST ").unwrap());

        assert_eq!(core.tests().unwrap().len(), 1);
        assert_eq!(core.procedures(&test).unwrap().len(), 1);
    }

    #[test]
    fn test_add_preserves_insertion_order() {
        let (mut core, _temp) = create_test_core();

        for name in ["HTOL", "HAST", "ESD"] {
            core.add_test(name).unwrap();
        }

        assert_eq!(
            core.tests().unwrap(),
            vec![make_test("HTOL"), make_test("HAST"), make_test("ESD")]
        );
    }

    #[test]
    fn test_add_on_db_backend() {
        let (mut core, _temp) = create_test_db_core();

        assert!(core.add_test("HAST").unwrap());
        assert!(!core.add_test("HAST").unwrap());

        assert_eq!(core.tests().unwrap(), vec![make_test("HAST")]);
        assert!(core.procedures(&make_test("HAST")).unwrap().is_empty());
    }
}

mod delete_test {
    use super::common::{create_test_core, create_test_db_core, make_test};
    use super::*;

    #[test]
    fn test_delete_removes_test_and_procedure_file() {
        let (mut core, temp) = create_test_core();
        let test = make_test("HAST");
        core.add_test("HAST").unwrap();
        core.add_test("HTOL").unwrap();
        let proc_file = temp
            .path()
            .join("share")
            .join("TestProcedures")
            .join("HAST_procedures.json");
        assert!(proc_file.exists());

        assert!(core.delete_test(&test).unwrap());

        assert_eq!(core.tests().unwrap(), vec![make_test("HTOL")]);
        assert!(!proc_file.exists());
    }

    #[test]
    fn test_delete_absent_test_is_noop() {
        let (mut core, temp) = create_test_core();
        core.add_test("HAST").unwrap();
        let tests_file = temp.path().join("share").join("tests.json");
        let before = std::fs::read(&tests_file).unwrap();

        assert!(!core.delete_test(&make_test("HTOL")).unwrap());

        assert_eq!(std::fs::read(&tests_file).unwrap(), before);
    }

    #[test]
    fn test_delete_with_missing_procedure_file_succeeds() {
        let (mut core, temp) = create_test_core();
        core.add_test("HAST").unwrap();
        std::fs::remove_file(
            temp.path()
                .join("share")
                .join("TestProcedures")
                .join("HAST_procedures.json"),
        )
        .unwrap();

        assert!(core.delete_test(&make_test("HAST")).unwrap());
        assert!(core.tests().unwrap().is_empty());
    }

    #[test]
    fn test_delete_ignores_failure_to_remove_procedure_list() {
        let (mut core, temp) = create_test_core();
        core.add_test("HAST").unwrap();
        let proc_file = temp
            .path()
            .join("share")
            .join("TestProcedures")
            .join("HAST_procedures.json");
        std::fs::remove_file(&proc_file).unwrap();
        std::fs::create_dir(&proc_file).unwrap();

        assert!(core.delete_test(&make_test("HAST")).unwrap());

        assert!(core.tests().unwrap().is_empty());
        assert!(proc_file.is_dir());
    }

    #[test]
    fn test_delete_on_db_backend() {
        let (mut core, _temp) = create_test_db_core();
        let test = make_test("HAST");
        core.add_test("HAST").unwrap();
        core.add_procedure(&test, "Step1", Link::None).unwrap();

        assert!(core.delete_test(&test).unwrap());

        assert!(core.tests().unwrap().is_empty());
        assert!(core.procedures(&test).unwrap().is_empty());
    }
}

mod add_procedure {
    use super::common::{create_test_core, make_test, texts};
    use super::*;

    #[test]
    fn test_add_appends_in_order() {
        let (mut core, _temp) = create_test_core();
        let test = make_test("HAST");
        core.add_test("HAST").unwrap();

        core.add_procedure(&test, "Step1", Link::None).unwrap();
        core.add_procedure(&test, "Step2", Link::url("http://x"))
            .unwrap();

        let procedures = core.procedures(&test).unwrap();
        assert_eq!(texts(&procedures), vec!["Step1", "Step2"]);
        assert_eq!(procedures[0].link, Link::None);
        assert_eq!(procedures[1].link, Link::Url("http://x".to_string()));
    }

    #[test]
    fn test_add_returns_stable_id() {
        let (mut core, _temp) = create_test_core();
        let test = make_test("HAST");

        let id = core.add_procedure(&test, "Step1", Link::None).unwrap();

        assert!(id.is_some());
        assert_eq!(core.procedures(&test).unwrap()[0].id, id);
    }

    #[test]
    fn test_add_blank_text_is_noop() {
        let (mut core, _temp) = create_test_core();
        let test = make_test("HAST");
        core.add_test("HAST").unwrap();

        assert_eq!(core.add_procedure(&test, "", Link::None).unwrap(), None);
        assert_eq!(
            core.add_procedure(&test, "  ", Link::url("http://x"))
                .unwrap(),
            None
        );

        assert!(core.procedures(&test).unwrap().is_empty());
    }

    #[test]
    fn test_add_assigns_ids_to_legacy_entries() {
        let (mut core, temp) = create_test_core();
        let test = make_test("HAST");
        std::fs::write(
            temp.path()
                .join("share")
                .join("TestProcedures")
                .join("HAST_procedures.json"),
            r#"["Old step"]"#,
        )
        .unwrap();

        core.add_procedure(&test, "New step", Link::None).unwrap();

        let procedures = core.procedures(&test).unwrap();
        assert_eq!(texts(&procedures), vec!["Old step", "New step"]);
        assert!(procedures.iter().all(|p| p.id.is_some()));
    }
}

mod edit_procedure {
    use super::common::{create_test_core, make_test};
    use super::*;

    #[test]
    fn test_edit_text_keeps_link_and_other_entries() {
        let (mut core, _temp) = create_test_core();
        let test = make_test("HAST");
        core.add_procedure(&test, "Step1", Link::url("http://a"))
            .unwrap();
        core.add_procedure(&test, "Step2", Link::url("http://b"))
            .unwrap();
        let before = core.procedures(&test).unwrap();

        let edited = core
            .edit_procedure(&test, 0, ProcedureEdit::default().text("Step1-edited"))
            .unwrap();

        assert!(edited);
        let after = core.procedures(&test).unwrap();
        assert_eq!(after[0].text, "Step1-edited");
        assert_eq!(after[0].link, before[0].link);
        assert_eq!(after[0].id, before[0].id);
        assert_eq!(after[1], before[1]);
    }

    #[test]
    fn test_edit_link_only() {
        let (mut core, _temp) = create_test_core();
        let test = make_test("HAST");
        core.add_procedure(&test, "Step1", Link::url("http://a"))
            .unwrap();

        core.edit_procedure(&test, 0, ProcedureEdit::default().link(Link::None))
            .unwrap();

        let after = core.procedures(&test).unwrap();
        assert_eq!(after[0].text, "Step1");
        assert_eq!(after[0].link, Link::None);
    }

    #[test]
    fn test_edit_out_of_range_is_noop() {
        let (mut core, temp) = create_test_core();
        let test = make_test("HAST");
        core.add_procedure(&test, "Step1", Link::None).unwrap();
        let proc_file = temp
            .path()
            .join("share")
            .join("TestProcedures")
            .join("HAST_procedures.json");
        let before = std::fs::read(&proc_file).unwrap();

        let edited = core
            .edit_procedure(&test, 1, ProcedureEdit::default().text("x"))
            .unwrap();

        assert!(!edited);
        assert_eq!(std::fs::read(&proc_file).unwrap(), before);
    }

    #[test]
    fn test_edit_by_id_follows_shifted_entry() {
        let (mut core, _temp) = create_test_core();
        let test = make_test("HAST");
        core.add_procedure(&test, "Step1", Link::None).unwrap();
        let id = core
            .add_procedure(&test, "Step2", Link::None)
            .unwrap()
            .unwrap();

        // Another client removes the first entry; Step2 moves to index 0.
        core.delete_procedure(&test, 0).unwrap();
        core.edit_procedure_by_id(&test, id, ProcedureEdit::default().text("Step2-edited"))
            .unwrap();

        let after = core.procedures(&test).unwrap();
        assert_eq!(after.len(), 1);
        assert_eq!(after[0].text, "Step2-edited");
    }

    #[test]
    fn test_edit_by_unknown_id_is_rejected() {
        let (mut core, _temp) = create_test_core();
        let test = make_test("HAST");
        let id = core
            .add_procedure(&test, "Step1", Link::None)
            .unwrap()
            .unwrap();
        core.delete_procedure_by_id(&test, id).unwrap();
        core.add_procedure(&test, "Step2", Link::None).unwrap();
        let before = core.procedures(&test).unwrap();

        let result = core.edit_procedure_by_id(&test, id, ProcedureEdit::default().text("x"));

        assert!(matches!(result, Err(ProcLabError::ProcedureNotFound(missing)) if missing == id));
        assert_eq!(core.procedures(&test).unwrap(), before);
    }
}

mod delete_procedure {
    use super::common::{create_test_core, create_test_db_core, make_test, texts};
    use super::*;

    #[test]
    fn test_delete_removes_position() {
        let (mut core, _temp) = create_test_core();
        let test = make_test("HAST");
        for text in ["Step1", "Step2", "Step3"] {
            core.add_procedure(&test, text, Link::None).unwrap();
        }

        assert!(core.delete_procedure(&test, 1).unwrap());

        assert_eq!(
            texts(&core.procedures(&test).unwrap()),
            vec!["Step1", "Step3"]
        );
    }

    #[test]
    fn test_delete_out_of_range_leaves_file_untouched() {
        let (mut core, temp) = create_test_core();
        let test = make_test("HAST");
        core.add_procedure(&test, "Step1", Link::None).unwrap();
        let proc_file = temp
            .path()
            .join("share")
            .join("TestProcedures")
            .join("HAST_procedures.json");
        let before = std::fs::read(&proc_file).unwrap();
        let modified = std::fs::metadata(&proc_file).unwrap().modified().unwrap();

        assert!(!core.delete_procedure(&test, 1).unwrap());
        assert!(!core.delete_procedure(&test, usize::MAX).unwrap());

        assert_eq!(std::fs::read(&proc_file).unwrap(), before);
        assert_eq!(
            std::fs::metadata(&proc_file).unwrap().modified().unwrap(),
            modified
        );
    }

    #[test]
    fn test_delete_by_id_returns_removed_entry() {
        let (mut core, _temp) = create_test_db_core();
        let test = make_test("HAST");
        let id = core
            .add_procedure(&test, "Step1", Link::url("http://x"))
            .unwrap()
            .unwrap();
        core.add_procedure(&test, "Step2", Link::None).unwrap();

        let removed = core.delete_procedure_by_id(&test, id).unwrap();

        assert_eq!(removed.text, "Step1");
        assert_eq!(texts(&core.procedures(&test).unwrap()), vec!["Step2"]);
    }

    #[test]
    fn test_delete_by_unknown_id_is_rejected() {
        let (mut core, _temp) = create_test_core();
        let test = make_test("HAST");
        core.add_procedure(&test, "Step1", Link::None).unwrap();

        let result = core.delete_procedure_by_id(&test, ProcedureId::new());

        assert!(matches!(result, Err(ProcLabError::ProcedureNotFound(_))));
        assert_eq!(core.procedures(&test).unwrap().len(), 1);
    }
}

mod attach_file {
    use super::common::{create_test_file, make_test};
    use super::*;

    #[test]
    fn test_attach_copies_and_maps_url() {
        let temp = TempDir::new().unwrap();
        let share = temp.path().join("share");
        let mut config = Config::new(&share);
        config.url_mapper = Some(UrlMapper::new(
            share.to_string_lossy().into_owned(),
            "https://files.example/lab",
        ));
        let mut core = ProcLabCore::open_json(config).unwrap();
        let test = make_test("HAST");
        let source = create_test_file(&temp, "setup.pdf", b"%PDF");

        let link = core.attach_file(&test, &source).unwrap();

        let Link::File(file) = &link else {
            panic!("expected file link, got {link:?}");
        };
        assert_eq!(file.name, "setup.pdf");
        assert_eq!(
            file.url.as_deref(),
            Some("https://files.example/lab/TestProcedures/HAST_setup.pdf")
        );
        assert_eq!(std::fs::read(&file.path).unwrap(), b"%PDF");

        core.add_procedure(&test, "Setup", link.clone()).unwrap();
        assert_eq!(core.procedures(&test).unwrap()[0].link, link);
    }

    #[test]
    fn test_attach_without_mapping_has_no_url() {
        let temp = TempDir::new().unwrap();
        let mut core = ProcLabCore::open_json(Config::new(temp.path().join("share"))).unwrap();
        let source = create_test_file(&temp, "setup.pdf", b"%PDF");

        let link = core.attach_file(&make_test("HAST"), &source).unwrap();

        assert!(matches!(link, Link::File(FileRef { url: None, .. })));
        assert_eq!(core.remote_url("/anything"), None);
    }

    #[test]
    fn test_attach_under_relative_root_records_absolute_path() {
        let temp = tempfile::tempdir_in(".").unwrap();
        let share = temp.path().join("share");
        assert!(share.is_relative());
        let local_base = std::env::current_dir()
            .unwrap()
            .join(share.strip_prefix(".").unwrap());
        let mut config = Config::new(&share);
        config.url_mapper = Some(UrlMapper::new(
            local_base.to_string_lossy().into_owned(),
            "https://files.example/lab",
        ));
        let mut core = ProcLabCore::open_json(config).unwrap();
        let source = create_test_file(&temp, "doc.pdf", b"%PDF");

        let link = core.attach_file(&make_test("HTOL"), &source).unwrap();

        let Link::File(file) = &link else {
            panic!("expected file link, got {link:?}");
        };
        assert!(Path::new(&file.path).is_absolute());
        assert_eq!(
            file.url.as_deref(),
            Some("https://files.example/lab/TestProcedures/HTOL_doc.pdf")
        );
    }
}

mod refresh {
    use super::common::{create_test_core, make_test};
    use super::*;

    #[test]
    fn test_refresh_tracks_new_entries() {
        let (mut core, _temp) = create_test_core();
        let test = make_test("HAST");
        core.add_procedure(&test, "Step1", Link::None).unwrap();

        let first = core.refresh(&test, &Snapshot::default()).unwrap();
        assert_eq!(first.new_count(), 1);

        let second = core.refresh(&test, &first.snapshot).unwrap();
        assert_eq!(second.new_count(), 0);

        core.add_procedure(&test, "Step2", Link::None).unwrap();
        let third = core.refresh(&test, &second.snapshot).unwrap();
        let new: Vec<_> = third.new_entries().map(|e| e.procedure.text.as_str()).collect();
        assert_eq!(new, vec!["Step2"]);
    }
}
