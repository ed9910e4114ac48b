use anyhow::{Context, Result, ensure};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use thread_emulation::{
    CreationFlags, EmulationEvent, THREAD_PRIORITY_BELOW_NORMAL, THREAD_PRIORITY_HIGHEST,
    ThreadEmulation, ThreadEmulationDesc, ThreadHandle, ThreadPoolConfig, sleep,
};

pub fn run_cli_demos() -> Result<()> {
    let desc = ThreadEmulationDesc::new()
        .pool(
            ThreadPoolConfig::new()
                .worker_count(2)
                .thread_name_prefix("demo-worker"),
        )
        .emit_events(true)
        .assert_hook(|violation| log::warn!("Assert hook: {}", violation));
    let emulation = Arc::new(ThreadEmulation::new(desc)?);

    log::info!("=== Suspended Threads With Priorities ===");
    demo_suspended_threads(&emulation)?;

    log::info!("=== Thread-Local Storage ===");
    demo_thread_local_storage(&emulation)?;

    log::info!("=== Sleep ===");
    demo_sleep()?;

    log::info!("=== Misuse Reporting ===");
    demo_misuse(&emulation)?;

    for event in emulation.poll_events() {
        match event {
            EmulationEvent::ThreadCompleted { thread_id } => {
                log::debug!("Completed: {}", thread_id);
            }
            event if event.is_error() => log::warn!("Error event: {:?}", event),
            _ => {}
        }
    }

    Ok(())
}

fn demo_suspended_threads(emulation: &ThreadEmulation) -> Result<()> {
    let finished = Arc::new(AtomicUsize::new(0));
    let mut handles: Vec<ThreadHandle> = Vec::new();

    for (name, priority) in [
        ("streaming", THREAD_PRIORITY_BELOW_NORMAL),
        ("mixer", THREAD_PRIORITY_HIGHEST),
        ("loader", 0),
    ] {
        let finished = finished.clone();
        let handle = emulation.create_thread(
            move |name: &'static str| {
                log::info!("{} thread running", name);
                sleep(50);
                finished.fetch_add(1, Ordering::SeqCst);
            },
            name,
            CreationFlags::CREATE_SUSPENDED,
        )?;
        emulation.set_thread_priority(&handle, priority)?;
        handles.push(handle);
    }

    log::info!("{} threads waiting to be resumed", emulation.pending_count());
    ensure!(finished.load(Ordering::SeqCst) == 0, "suspended thread ran early");

    for handle in &handles {
        emulation.resume_thread(handle)?;
    }
    for handle in handles {
        ensure!(
            handle.wait_timeout(Duration::from_secs(5)),
            "thread {} did not finish",
            handle.id()
        );
        handle.close();
    }

    log::info!("All {} threads finished", finished.load(Ordering::SeqCst));
    Ok(())
}

fn demo_thread_local_storage(emulation: &Arc<ThreadEmulation>) -> Result<()> {
    let index = emulation.tls_alloc()?;
    log::info!("Allocated {}", index);

    let handles = (0..3u32)
        .map(|voice| {
            let inner = emulation.clone();
            emulation.create_thread(
                move |voice: u32| {
                    let inherited = inner.tls_get_value(index).ok().flatten().is_some();
                    if let Err(e) = inner.tls_set_value(index, Some(Arc::new(voice))) {
                        log::error!("Voice {} failed to store its id: {}", voice, e);
                        return;
                    }
                    log::info!("Voice {} stored its id (inherited value: {})", voice, inherited);
                },
                voice,
                CreationFlags::empty(),
            )
        })
        .collect::<thread_emulation::Result<Vec<_>>>()?;

    for handle in &handles {
        handle.wait();
    }
    emulation.tls_free(index)?;
    Ok(())
}

fn demo_sleep() -> Result<()> {
    for ms in [0, 10, 100] {
        let start = Instant::now();
        sleep(ms);
        log::info!("sleep({}) took {:?}", ms, start.elapsed());
    }
    Ok(())
}

fn demo_misuse(emulation: &ThreadEmulation) -> Result<()> {
    let handle = emulation.create_thread(|_: ()| {}, (), CreationFlags::empty())?;

    match emulation.resume_thread(&handle) {
        Ok(_) => anyhow::bail!("resuming a running thread should fail"),
        Err(e) => log::info!("Resume rejected: {}", e),
    }
    match emulation.set_thread_priority(&handle, 1) {
        Ok(_) => anyhow::bail!("changing priority of a running thread should fail"),
        Err(e) => log::info!("Priority change rejected: {}", e),
    }

    handle.wait_timeout(Duration::from_secs(5)).then_some(()).context("thread did not finish")
}
