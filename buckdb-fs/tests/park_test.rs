//! End-to-end check that the filesystem driver carries the same bucket/ORM semantics as
//! the in-memory reference driver, and that committed data survives a fresh [`FsDriver`]
//! over the same directory.

use buckdb::{create_model, load, save, Database, DatabaseFlags, DriverRegistry, Model};
use buckdb_fs::FsDriverFactory;
use tempfile::tempdir;

#[derive(Default, Model, Debug, Clone, PartialEq, Eq)]
struct User {
    #[key]
    id: u64,
    #[index]
    name: String,
    #[slice]
    pets: Vec<String>,
}

fn registry() -> DriverRegistry {
    let mut registry = DriverRegistry::empty();
    registry.register("fs", FsDriverFactory::new());
    registry
}

#[test]
fn test_flow() -> anyhow::Result<()> {
    let temp_dir = tempdir()?;
    let uri = format!("fs://{}", temp_dir.path().display());
    let registry = registry();

    {
        let db = Database::open_with_registry(&uri, DatabaseFlags::CREATE_IF_NOT_EXISTS, &registry)?;
        db.update(|tx| {
            create_model::<User>(tx)?;
            save(
                tx,
                &User {
                    id: 1,
                    name: "Alice".to_string(),
                    pets: vec!["Fluffy".to_string()],
                },
            )?;
            save(
                tx,
                &User {
                    id: 2,
                    name: "Bob".to_string(),
                    pets: vec!["Rover".to_string()],
                },
            )
        })?;
    }

    // Reopen against the same directory: files on disk are the only state carried over.
    let db = Database::open_with_registry(&uri, DatabaseFlags::NONE, &registry)?;
    db.view(|tx| {
        let alice: User = load(tx, &1u64)?;
        assert_eq!(alice.name, "Alice");
        assert_eq!(alice.pets, vec!["Fluffy".to_string()]);

        let bob: User = buckdb::load_by_index(tx, "name", &"Bob".to_string())?;
        assert_eq!(bob.id, 2);
        Ok(())
    })?;

    let file_count = std::fs::read_dir(temp_dir.path())?.count();
    assert!(file_count > 0, "committed entries should persist as files");

    Ok(())
}
