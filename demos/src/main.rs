//! Runnable walkthrough of the six end-to-end scenarios the bucket/ORM layout is built
//! to satisfy, the way `kivis`'s own `examples/usage.rs` exercised its record/index
//! semantics.

use buckdb::{create_model, load, load_by_index, save, Database, DatabaseFlags, Model};

#[derive(Default, Model, Debug)]
struct User {
    #[key]
    id: u64,
    name: String,
    #[slice]
    tags: Vec<String>,
}

#[derive(Default, Model, Debug)]
struct Item {
    #[key]
    id: u64,
    #[index]
    sku: String,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    smoke()?;
    identity_reuse()?;
    bulk_numeric_iteration()?;
    orm_round_trip()?;
    indexed_update()?;
    rollback()?;

    println!("all six scenarios passed");
    Ok(())
}

fn smoke() -> anyhow::Result<()> {
    let db = Database::open("memory://demo-smoke", DatabaseFlags::CREATE_IF_NOT_EXISTS)?;
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
    println!("smoke: ok");
    Ok(())
}

fn identity_reuse() -> anyhow::Result<()> {
    let db = Database::open("memory://demo-identity", DatabaseFlags::NONE)?;
    db.update(|tx| {
        for n in 1..=5 {
            tx.create_bucket(&n.to_string())?;
        }
        tx.remove_bucket("3")?;
        let reused = tx.create_bucket("20")?;
        assert_eq!(reused.identity(), 3);
        Ok(())
    })?;
    println!("identity reuse: ok, identity 3 reassigned to bucket \"20\"");
    Ok(())
}

fn bulk_numeric_iteration() -> anyhow::Result<()> {
    let db = Database::open("memory://demo-bulk", DatabaseFlags::NONE)?;
    db.update(|tx| {
        let bucket = tx.create_bucket("n")?;
        for i in 0u32..100_000 {
            tx.set_typed(&bucket, &i, &i)?;
        }
        Ok(())
    })?;
    let count = db.view(|tx| {
        let bucket = tx.bucket("n")?.unwrap();
        Ok(tx.iter(&bucket)?.count())
    })?;
    assert_eq!(count, 100_000);
    println!("bulk numeric iteration: ok, {count} entries in order");
    Ok(())
}

fn orm_round_trip() -> anyhow::Result<()> {
    let db = Database::open("memory://demo-orm", DatabaseFlags::NONE)?;
    db.update(|tx| {
        create_model::<User>(tx)?;
        save(
            tx,
            &User {
                id: 42,
                name: "ada".to_string(),
                tags: vec!["x".to_string(), "y".to_string(), "x".to_string()],
            },
        )
    })?;
    db.view(|tx| {
        let loaded: User = load(tx, &42u64)?;
        assert_eq!(loaded.tags, vec!["x".to_string(), "y".to_string()]);
        println!(
            "orm round trip: ok, User {{ id: {}, name: {:?}, tags: {:?} }}",
            loaded.id, loaded.name, loaded.tags
        );
        Ok(())
    })?;
    Ok(())
}

fn indexed_update() -> anyhow::Result<()> {
    let db = Database::open("memory://demo-index", DatabaseFlags::NONE)?;
    db.update(|tx| {
        create_model::<Item>(tx)?;
        save(
            tx,
            &Item {
                id: 1,
                sku: "A".to_string(),
            },
        )?;
        save(
            tx,
            &Item {
                id: 1,
                sku: "B".to_string(),
            },
        )
    })?;
    db.view(|tx| {
        let stale = load_by_index::<Item>(tx, "sku", &"A".to_string());
        assert!(stale.is_err());
        let current: Item = load_by_index(tx, "sku", &"B".to_string())?;
        println!("indexed update: ok, item {} now indexed under sku {:?}", current.id, current.sku);
        Ok(())
    })?;
    Ok(())
}

fn rollback() -> anyhow::Result<()> {
    let db = Database::open("memory://demo-rollback", DatabaseFlags::NONE)?;
    let outcome = db.update(|tx| {
        tx.create_bucket("x")?;
        Err(buckdb::Error::BucketNotFound("deliberate".to_string()))
    });
    assert!(outcome.is_err());
    db.view(|tx| {
        assert!(tx.bucket("x")?.is_none());
        Ok(())
    })?;
    println!("rollback: ok, bucket \"x\" never persisted");
    Ok(())
}
