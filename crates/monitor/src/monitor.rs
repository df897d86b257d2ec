use crate::{clock::Clock, schedule::Schedule};
use netwatch_core::{Result, RunContext, Sample, Snapshot, StatsEngine, Window};
use netwatch_recorder::{DataSink, LogSink, Recorder};
use netwatch_system::Probe;
use std::future::Future;
use std::pin::pin;
use tracing::{debug, info};

/// Where the sampler is within a cycle.
///
/// `Idle` is the only state in which the loop suspends, and therefore the
/// only point at which a shutdown request is honoured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Sampling,
    Recording,
}

/// The sampling loop: owns the window and the run statistics for the whole
/// run and drives one probe per period.
#[derive(Debug)]
pub struct Monitor<C, P> {
    ctx:      RunContext,
    clock:    C,
    probe:    P,
    window:   Window,
    stats:    StatsEngine,
    schedule: Schedule,
    phase:    Phase,
}

impl<C: Clock, P: Probe> Monitor<C, P> {
    pub fn new(ctx: RunContext, clock: C, probe: P) -> Self {
        let schedule = Schedule::new(ctx.start, ctx.period);
        Self {
            ctx,
            clock,
            probe,
            window: Window::new(),
            stats: StatsEngine::new(),
            schedule,
            phase: Phase::Idle,
        }
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    pub fn stats(&self) -> &StatsEngine {
        &self.stats
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Sleep until the next sample is due.
    pub async fn wait(&mut self) {
        let wait = self.schedule.advance(self.clock.now());
        self.clock.sleep(wait).await;
    }

    /// Take one sample and push it through the window, the statistics and
    /// both sinks.  Runs to completion once started.
    pub async fn sample<D: DataSink, L: LogSink>(
        &mut self,
        recorder: &mut Recorder<D, L>,
    ) -> Result<Snapshot> {
        self.phase = Phase::Sampling;
        let timestamp = self.clock.now();
        let success = self.probe.probe(&self.ctx.target).await;
        let sample = Sample::new(timestamp, success);

        self.phase = Phase::Recording;
        self.window.push(sample)?;
        recorder.record_sample(&sample)?;

        let evicted = self.window.trim(self.ctx.cutoff(timestamp));
        let snapshot = self.stats.observe(&self.window, &self.ctx)?;
        recorder.record_status(&snapshot, self.stats.histogram())?;

        debug!(
            success,
            evicted,
            avg = snapshot.avg_success,
            bucket = snapshot.bucket,
            "cycle complete"
        );
        self.phase = Phase::Idle;
        Ok(snapshot)
    }

    /// One full cycle: wait for the deadline, then sample.
    pub async fn cycle<D: DataSink, L: LogSink>(
        &mut self,
        recorder: &mut Recorder<D, L>,
    ) -> Result<Snapshot> {
        self.wait().await;
        self.sample(recorder).await
    }

    /// Sample forever, until `shutdown` resolves or a sink fails.
    ///
    /// `shutdown` is only observed while waiting for the next deadline; a
    /// cycle that has started always finishes and is recorded.  Sinks are
    /// flushed before a clean return.
    pub async fn run<D, L, F>(&mut self, recorder: &mut Recorder<D, L>, shutdown: F) -> Result<()>
    where
        D: DataSink,
        L: LogSink,
        F: Future<Output = ()>,
    {
        let mut shutdown = pin!(shutdown);

        loop {
            let wait = self.schedule.advance(self.clock.now());
            tokio::select! {
                biased;
                _ = &mut shutdown => break,
                _ = self.clock.sleep(wait) => {}
            }
            self.sample(recorder).await?;
        }

        info!(
            "Shutting down after {} samples (min success {:?})",
            self.stats.total_samples(),
            self.stats.min_success()
        );
        recorder.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Local, TimeDelta};
    use netwatch_core::MonitorError;
    use std::cell::{Cell, RefCell};
    use std::collections::VecDeque;
    use std::rc::Rc;
    use std::time::Duration;
    use tokio::sync::oneshot;

    /// Clock that only moves when told to; sleeping advances it instantly.
    #[derive(Debug, Clone)]
    struct FakeClock {
        now:    Rc<Cell<DateTime<Local>>>,
        sleeps: Rc<RefCell<Vec<Duration>>>,
    }

    impl FakeClock {
        fn new(start: DateTime<Local>) -> Self {
            Self {
                now:    Rc::new(Cell::new(start)),
                sleeps: Rc::default(),
            }
        }

        fn advance(&self, by: Duration) {
            self.now.set(self.now.get() + TimeDelta::from_std(by).unwrap());
        }

        fn set(&self, to: DateTime<Local>) {
            self.now.set(to);
        }
    }

    impl Clock for FakeClock {
        fn now(&self) -> DateTime<Local> {
            self.now.get()
        }

        fn sleep(&self, duration: Duration) -> impl Future<Output = ()> {
            self.sleeps.borrow_mut().push(duration);
            self.advance(duration);
            std::future::ready(())
        }
    }

    /// Probe replaying scripted results, each taking a scripted latency.
    struct ScriptedProbe {
        clock:     FakeClock,
        results:   VecDeque<bool>,
        latencies: Vec<Duration>,
        calls:     usize,
        on_call:   Option<(usize, oneshot::Sender<()>)>,
    }

    impl ScriptedProbe {
        fn new(clock: FakeClock, results: impl IntoIterator<Item = bool>) -> Self {
            Self {
                clock,
                results: results.into_iter().collect(),
                latencies: vec![Duration::ZERO],
                calls: 0,
                on_call: None,
            }
        }

        fn with_latencies(mut self, latencies: Vec<Duration>) -> Self {
            self.latencies = latencies;
            self
        }
    }

    impl Probe for ScriptedProbe {
        fn probe(&mut self, _host: &str) -> impl Future<Output = bool> {
            let latency = self.latencies[self.calls % self.latencies.len()];
            self.calls += 1;
            self.clock.advance(latency);

            if matches!(self.on_call, Some((n, _)) if n == self.calls) {
                if let Some((_, tx)) = self.on_call.take() {
                    let _ = tx.send(());
                }
            }

            std::future::ready(self.results.pop_front().unwrap_or(true))
        }
    }

    #[derive(Debug, Default)]
    struct MemData(Vec<Sample>);

    impl DataSink for MemData {
        fn append(&mut self, sample: &Sample) -> Result<()> {
            self.0.push(*sample);
            Ok(())
        }
    }

    #[derive(Debug, Default)]
    struct MemLog(Vec<String>);

    impl LogSink for MemLog {
        fn write_line(&mut self, line: &str) -> Result<()> {
            self.0.push(line.to_string());
            Ok(())
        }
    }

    struct BrokenSink;

    impl DataSink for BrokenSink {
        fn append(&mut self, _sample: &Sample) -> Result<()> {
            Err(MonitorError::Io {
                source: std::io::Error::other("disk full"),
            })
        }
    }

    fn t0() -> DateTime<Local> {
        DateTime::from_timestamp(1_700_000_000, 0)
            .unwrap()
            .with_timezone(&Local)
    }

    fn ctx(window_secs: u64, period_ms: u64) -> RunContext {
        RunContext::new(
            t0(),
            Duration::from_secs(window_secs),
            Duration::from_millis(period_ms),
            "8.8.8.8",
        )
        .unwrap()
    }

    fn recorder() -> Recorder<MemData, MemLog> {
        Recorder::new(MemData::default(), MemLog::default(), "Test_Net")
    }

    #[tokio::test]
    async fn scripted_run_matches_expected_statistics() {
        let clock = FakeClock::new(t0());
        let probe = ScriptedProbe::new(clock.clone(), [true, true, false, false, false]);
        let mut monitor = Monitor::new(ctx(5, 1_000), clock, probe);
        let mut rec = recorder();

        let mut last = None;
        for _ in 0..5 {
            last = Some(monitor.cycle(&mut rec).await.unwrap());
        }
        let snap = last.unwrap();

        assert_eq!(monitor.window().len(), 5);
        assert!((snap.avg_success - 0.4).abs() < 1e-12);
        assert_eq!(snap.bucket, 5);
        assert!((snap.min_success - 0.4).abs() < 1e-12);
        assert_eq!(snap.total_samples, 5);

        let hist = monitor.stats().histogram();
        assert_eq!(hist.total(), 5);
        assert_eq!(hist.count(5), 1);
        assert_eq!(hist.count(6), 1);
        assert_eq!(hist.count(7), 1);
        assert_eq!(hist.count(11), 2);

        let (data, log) = rec.into_parts();
        assert_eq!(data.0.len(), 5);
        assert_eq!(log.0.iter().filter(|l| l.starts_with("<<<<")).count(), 5);
    }

    #[tokio::test]
    async fn latency_does_not_accumulate_drift() {
        let clock = FakeClock::new(t0());
        let latencies = [300, 900, 50, 999, 0, 620]
            .into_iter()
            .map(Duration::from_millis)
            .collect();
        let probe = ScriptedProbe::new(clock.clone(), []).with_latencies(latencies);
        let mut monitor = Monitor::new(ctx(30, 1_000), clock, probe);
        let mut rec = recorder();

        for _ in 0..200 {
            monitor.cycle(&mut rec).await.unwrap();
        }

        let (data, _) = rec.into_parts();
        let stamps: Vec<_> = data.0.iter().map(|s| s.timestamp).collect();
        assert_eq!(stamps[0], t0() + TimeDelta::seconds(1));
        for pair in stamps.windows(2) {
            assert_eq!(pair[1] - pair[0], TimeDelta::seconds(1));
        }
        assert_eq!(stamps[199] - stamps[0], TimeDelta::seconds(199));
    }

    #[tokio::test]
    async fn overrunning_probe_skips_sleep_and_stretches_period() {
        let clock = FakeClock::new(t0());
        let probe = ScriptedProbe::new(clock.clone(), [])
            .with_latencies(vec![Duration::from_millis(2_500)]);
        let mut monitor = Monitor::new(ctx(30, 1_000), clock.clone(), probe);
        let mut rec = recorder();

        for _ in 0..4 {
            monitor.cycle(&mut rec).await.unwrap();
        }

        let sleeps = clock.sleeps.borrow().clone();
        assert_eq!(sleeps[0], Duration::from_secs(1));
        assert!(sleeps[1..].iter().all(|d| d.is_zero()));

        let (data, _) = rec.into_parts();
        for pair in data.0.windows(2) {
            assert_eq!(pair[1].timestamp - pair[0].timestamp, TimeDelta::milliseconds(2_500));
        }
    }

    #[tokio::test]
    async fn window_holds_only_recent_samples() {
        let clock = FakeClock::new(t0());
        let probe = ScriptedProbe::new(clock.clone(), (0..20).map(|i| i % 3 != 0));
        let mut monitor = Monitor::new(ctx(5, 1_000), clock, probe);
        let mut rec = recorder();

        for _ in 0..20 {
            monitor.cycle(&mut rec).await.unwrap();
            let newest = monitor.window().newest().unwrap().timestamp;
            let cutoff = newest - TimeDelta::seconds(5);
            assert!(monitor.window().iter().all(|s| s.timestamp >= cutoff));
        }
        // Samples at t-5s .. t inclusive.
        assert_eq!(monitor.window().len(), 6);
        assert_eq!(monitor.stats().histogram().total(), 20);
    }

    #[tokio::test]
    async fn phase_returns_to_idle_after_cycle() {
        let clock = FakeClock::new(t0());
        let probe = ScriptedProbe::new(clock.clone(), [false]);
        let mut monitor = Monitor::new(ctx(30, 1_000), clock, probe);
        assert_eq!(monitor.phase(), Phase::Idle);

        let snap = monitor.cycle(&mut recorder()).await.unwrap();
        assert_eq!(monitor.phase(), Phase::Idle);
        assert_eq!(snap.bucket, 0);
        assert_eq!(snap.min_success, 0.0);
    }

    #[tokio::test]
    async fn clock_going_backwards_is_invariant_violation() {
        let clock = FakeClock::new(t0());
        let probe = ScriptedProbe::new(clock.clone(), [true, true]);
        let mut monitor = Monitor::new(ctx(30, 1_000), clock.clone(), probe);
        let mut rec = recorder();

        monitor.sample(&mut rec).await.unwrap();
        clock.set(t0() - TimeDelta::seconds(10));
        let err = monitor.sample(&mut rec).await.unwrap_err();

        assert!(matches!(err, MonitorError::Invariant(_)));
        // The rejected sample never reached the data sink.
        let (data, _) = rec.into_parts();
        assert_eq!(data.0.len(), 1);
    }

    #[tokio::test]
    async fn sink_failure_stops_the_run() {
        let clock = FakeClock::new(t0());
        let probe = ScriptedProbe::new(clock.clone(), [true]);
        let mut monitor = Monitor::new(ctx(30, 1_000), clock, probe);
        let mut rec = Recorder::new(BrokenSink, MemLog::default(), "Test_Net");

        let err = monitor
            .run(&mut rec, std::future::pending())
            .await
            .unwrap_err();
        assert!(matches!(err, MonitorError::Io { .. }));
        assert_eq!(monitor.phase(), Phase::Recording);
    }

    #[tokio::test]
    async fn shutdown_is_not_observed_mid_cycle() {
        let clock = FakeClock::new(t0());
        let (tx, rx) = oneshot::channel();
        let mut probe = ScriptedProbe::new(clock.clone(), [true, false, true, true]);
        // Shutdown is requested while the third probe is in flight.
        probe.on_call = Some((3, tx));
        let mut monitor = Monitor::new(ctx(30, 1_000), clock, probe);
        let mut rec = recorder();

        monitor
            .run(&mut rec, async {
                let _ = rx.await;
            })
            .await
            .unwrap();

        // The interrupted cycle still completed and was recorded.
        assert_eq!(monitor.phase(), Phase::Idle);
        assert_eq!(monitor.stats().total_samples(), 3);
        let (data, log) = rec.into_parts();
        assert_eq!(data.0.len(), 3);
        assert_eq!(log.0.iter().filter(|l| l.starts_with("<<<<")).count(), 3);
    }

    #[tokio::test]
    async fn shutdown_before_first_deadline_takes_no_samples() {
        let clock = FakeClock::new(t0());
        let probe = ScriptedProbe::new(clock.clone(), []);
        let mut monitor = Monitor::new(ctx(30, 1_000), clock, probe);
        let mut rec = recorder();

        monitor.run(&mut rec, std::future::ready(())).await.unwrap();
        assert_eq!(monitor.stats().total_samples(), 0);
    }

    #[tokio::test]
    async fn cycles_land_in_files_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let clock = FakeClock::new(t0());
        let probe = ScriptedProbe::new(clock.clone(), [true, false, true]);
        let mut monitor = Monitor::new(ctx(30, 1_000), clock, probe);
        let mut rec = Recorder::open(dir.path(), "Test_Net", t0(), false).unwrap();

        for _ in 0..3 {
            monitor.cycle(&mut rec).await.unwrap();
        }
        rec.flush().unwrap();

        let paths = netwatch_recorder::OutputPaths::new(dir.path(), "Test_Net", t0());
        let csv = std::fs::read_to_string(&paths.data).unwrap();
        let rows: Vec<&str> = csv.lines().collect();
        assert_eq!(rows[0], "tov,result");
        assert_eq!(rows.len(), 4);
        assert!(rows[2].ends_with(",False"));

        let log = std::fs::read_to_string(&paths.log).unwrap();
        assert_eq!(log.lines().filter(|l| l.starts_with("<<<<")).count(), 3);
        assert!(log.contains("Network: Test_Net"));
        assert!(log.contains("        Total count: 3"));
    }
}
