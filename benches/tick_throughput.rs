use harness::{bench, Bencher};
use std::sync::Mutex;

use pwcache::{Builder, Config, Pid, Pwc, TranslationReq, VAddr};

static PWC: Mutex<Option<Pwc>> = Mutex::new(None);

fn startup() {
    let scenario = std::env::var("SCENARIO").unwrap_or("ColdMiss".to_string());
    let config = Config {
        num_sets: 1,
        num_ways: 32,
        num_mshr_entry: 16,
        len_pwqueue: 64,
        num_walkers: 4,
        num_req_per_cycle: 4,
        ..Config::default()
    };
    let mut pwc = Builder::new().with_config(config).build("pwc0").unwrap();

    if scenario == "L2Hit" {
        // Warm one entry so the driven workload hits at L2.
        pwc.top.rx.send(TranslationReq::new("client", "pwc0.TopPort", 0, Pid(1), VAddr(0x1000), 0));
        for cycle in 0..64u64 {
            pwc.tick(cycle);
            if let Some(fetch) = pwc.bottom.tx.retrieve() {
                pwc.bottom.rx.send(pwcache::TranslationRsp::new(
                    "low-module",
                    "pwc0.BottomPort",
                    cycle,
                    fetch.id,
                    pwcache::Page::new(Pid(1), VAddr(0x1000), 0),
                ));
            }
        }
        for cycle in 64..80u64 {
            pwc.tick(cycle);
            pwc.top.tx.retrieve();
        }
    }

    *PWC.lock().unwrap() = Some(pwc);
}

fn teardown() {
    let _pwc = PWC.lock().unwrap().take().unwrap();
}

#[bench(startup=startup, teardown=teardown)]
fn tick_throughput(b: &Bencher) {
    let mut guard = PWC.lock().unwrap();
    let pwc = guard.as_mut().unwrap();

    let mut cycle = 1_000u64;
    let mut ticks = 0u64;
    b.time(|| {
        for _ in 0..10_000 {
            pwc.top.rx.send(TranslationReq::new("client", "pwc0.TopPort", cycle, Pid(cycle % 8), VAddr(0x1000 * (cycle % 8 + 1)), 0));
            pwc.tick(cycle);
            pwc.top.tx.retrieve();
            if let Some(fetch) = pwc.bottom.tx.retrieve() {
                pwc.bottom.rx.send(pwcache::TranslationRsp::new(
                    "low-module",
                    "pwc0.BottomPort",
                    cycle,
                    fetch.id,
                    pwcache::Page::new(fetch.pid, fetch.vaddr, 0),
                ));
            }
            cycle += 1;
            ticks += 1;
        }
    });
    b.add_stat("ticks", ticks);
}
