//! The six end-to-end scenarios a complete implementation of this bucket/ORM model must
//! pass: smoke, identity reuse, bulk numeric iteration, ORM round-trip, indexed update,
//! and rollback.

use buckdb::{DatabaseFlags, Database, Encode, Error, Model};

#[test]
fn smoke() -> anyhow::Result<()> {
    let db = Database::open("memory://t1", DatabaseFlags::CREATE_IF_NOT_EXISTS)?;

    db.update(|tx| {
        let bucket = tx.create_bucket("1")?;
        tx.set(&bucket, b"name", b"john".to_vec())?;
        Ok(())
    })?;

    db.view(|tx| {
        let bucket = tx.bucket("1")?.unwrap();
        assert_eq!(tx.get(&bucket, b"name")?, Some(b"john".to_vec()));
        Ok(())
    })?;

    Ok(())
}

#[test]
fn identity_reuse() -> anyhow::Result<()> {
    let db = Database::open("memory://t2", DatabaseFlags::NONE)?;

    db.update(|tx| {
        for n in 1..=5 {
            let bucket = tx.create_bucket(&n.to_string())?;
            assert_eq!(bucket.identity(), n);
        }
        tx.remove_bucket("3")?;
        let reused = tx.create_bucket("20")?;
        assert_eq!(reused.identity(), 3);
        Ok(())
    })?;

    Ok(())
}

#[test]
fn bulk_numeric_iteration() -> anyhow::Result<()> {
    let db = Database::open("memory://t3", DatabaseFlags::NONE)?;

    db.update(|tx| {
        let bucket = tx.create_bucket("n")?;
        for i in 0u32..100_000 {
            tx.set_typed(&bucket, &i, &i)?;
        }
        Ok(())
    })?;

    db.view(|tx| {
        let bucket = tx.bucket("n")?.unwrap();
        let mut count = 0usize;
        for (index, entry) in tx.iter(&bucket)?.enumerate() {
            let (key, value) = entry?;
            assert_eq!(key, (index as u32).to_be_bytes().to_vec());
            assert_eq!(value, (index as u32).to_be_bytes().to_vec());
            count += 1;
        }
        assert_eq!(count, 100_000);
        Ok(())
    })?;

    Ok(())
}

#[derive(Default, buckdb::Model, Debug, PartialEq, Eq)]
struct User {
    #[key]
    id: u64,
    name: String,
    #[slice]
    tags: Vec<String>,
}

#[test]
fn orm_round_trip() -> anyhow::Result<()> {
    let db = Database::open("memory://t4", DatabaseFlags::NONE)?;

    db.update(|tx| {
        buckdb::create_model::<User>(tx)?;
        buckdb::save(
            tx,
            &User {
                id: 42,
                name: "ada".to_string(),
                tags: vec!["x".to_string(), "y".to_string(), "x".to_string()],
            },
        )?;
        Ok(())
    })?;

    db.view(|tx| {
        let loaded: User = buckdb::load(tx, &42u64)?;
        assert_eq!(loaded.name, "ada");
        assert_eq!(loaded.tags, vec!["x".to_string(), "y".to_string()]);

        let slice_bucket = tx.bucket(&format!("User.{}.tags", buckdb::hex_encode(&42u64.encode())))?.unwrap();
        let keys: Vec<String> = tx
            .iter(&slice_bucket)?
            .map(|entry| entry.map(|(key, _)| String::from_utf8(key).unwrap()))
            .collect::<Result<_, Error>>()?;
        assert_eq!(keys, vec!["x".to_string(), "y".to_string()]);
        Ok(())
    })?;

    Ok(())
}

#[derive(Default, buckdb::Model, Debug, PartialEq, Eq)]
struct Item {
    #[key]
    id: u64,
    #[index]
    sku: String,
}

#[test]
fn indexed_update() -> anyhow::Result<()> {
    let db = Database::open("memory://t5", DatabaseFlags::NONE)?;

    db.update(|tx| {
        buckdb::create_model::<Item>(tx)?;
        buckdb::save(
            tx,
            &Item {
                id: 1,
                sku: "A".to_string(),
            },
        )?;
        buckdb::save(
            tx,
            &Item {
                id: 1,
                sku: "B".to_string(),
            },
        )?;
        Ok(())
    })?;

    db.view(|tx| {
        let old: Result<Item, Error> = buckdb::load_by_index(tx, "sku", &"A".to_string());
        assert!(matches!(old, Err(Error::NoMatchingRecord)));

        let current: Item = buckdb::load_by_index(tx, "sku", &"B".to_string())?;
        assert_eq!(current.id, 1);
        assert_eq!(current.sku, "B");
        Ok(())
    })?;

    Ok(())
}

#[test]
fn rollback_on_error() -> anyhow::Result<()> {
    let db = Database::open("memory://t6", DatabaseFlags::NONE)?;

    let outcome = db.update(|tx| {
        tx.create_bucket("x")?;
        Err(Error::BucketNotFound("deliberate".to_string()))
    });
    assert!(outcome.is_err());

    db.view(|tx| {
        assert!(tx.bucket("x")?.is_none());
        Ok(())
    })?;

    Ok(())
}

#[test]
fn bucket_stats_report_identity_and_entry_count() -> anyhow::Result<()> {
    let db = Database::open("memory://t7", DatabaseFlags::NONE)?;

    db.update(|tx| {
        let bucket = tx.create_bucket("stats")?;
        for i in 0u32..3 {
            tx.set_typed(&bucket, &i, &i)?;
        }

        let stats = tx.bucket_stats("stats")?;
        assert_eq!(stats.identity, bucket.identity());
        assert_eq!(stats.len, 3);

        tx.remove(&bucket, &0u32.encode())?;
        let stats = tx.bucket_stats("stats")?;
        assert_eq!(stats.len, 2);

        assert!(matches!(
            tx.bucket_stats("missing"),
            Err(Error::BucketNotFound(_))
        ));
        Ok(())
    })?;

    Ok(())
}

#[derive(Default, buckdb::Model, Debug, PartialEq, Eq)]
struct Counter {
    #[key]
    id: u64,
    label: String,
}

#[test]
fn autoincrement_assigns_successive_keys() -> anyhow::Result<()> {
    let db = Database::open("memory://t8", DatabaseFlags::NONE)?;

    db.update(|tx| {
        buckdb::create_model::<Counter>(tx)?;

        let first = buckdb::save_next::<Counter>(tx, |id| Counter {
            id,
            label: "first".to_string(),
        })?;
        let second = buckdb::save_next::<Counter>(tx, |id| Counter {
            id,
            label: "second".to_string(),
        })?;

        assert_eq!(first, 1);
        assert_eq!(second, 2);
        assert_eq!(buckdb::next_key::<Counter>(tx)?, 3);

        let loaded: Counter = buckdb::load(tx, &second)?;
        assert_eq!(loaded.label, "second");
        Ok(())
    })?;

    Ok(())
}
