use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use logsplit_types::PASSTHROUGH_CHANNEL;

use crate::error::{FilterError, Result};
use crate::registry::FilterRegistry;

/// Destination for routed lines
pub trait Sink {
    fn accept(&mut self, line: &str) -> io::Result<()>;

    /// Push out anything buffered; called once when a run finishes
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Sink for Vec<String> {
    fn accept(&mut self, line: &str) -> io::Result<()> {
        self.push(line.to_string());
        Ok(())
    }
}

impl<S: Sink + ?Sized> Sink for Box<S> {
    fn accept(&mut self, line: &str) -> io::Result<()> {
        (**self).accept(line)
    }

    fn flush(&mut self) -> io::Result<()> {
        (**self).flush()
    }
}

/// Counters for one routing run
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RouteStats {
    /// Lines pulled from the input, blank ones included
    pub lines_read: usize,

    /// Lines dropped because they were empty after trimming
    pub blank_skipped: usize,

    /// Lines handed to the pass-through sink
    pub passthrough: usize,

    /// Lines delivered per channel, in registry order
    pub delivered: Vec<(String, usize)>,

    /// Run ended because the stop flag was raised
    pub stopped_early: bool,
}

impl RouteStats {
    /// Lines delivered to a channel (0 for unknown names)
    pub fn delivered_to(&self, name: &str) -> usize {
        self.delivered
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, count)| *count)
            .unwrap_or(0)
    }
}

/// Sinks handed back after a finished run
#[derive(Debug)]
pub struct Routed<S> {
    /// `(channel name, sink)` in registry order
    pub channels: Vec<(String, S)>,
    pub passthrough: Option<S>,
    pub stats: RouteStats,
}

/// Routes trimmed, non-blank lines to every channel whose filter matches
///
/// Lines are handled strictly one at a time: each line is matched against
/// every filter and delivered before the next is read, so each channel sees
/// lines in input order.
pub struct LineRouter<'r, S> {
    registry: &'r FilterRegistry,

    /// One sink per registry entry, same order
    sinks: Vec<S>,

    passthrough: Option<S>,

    stop: Option<Arc<AtomicBool>>,

    stats: RouteStats,
}

impl<'r, S: Sink> LineRouter<'r, S> {
    /// Open one sink per channel, in registry order, before any input is read
    pub fn open<F>(registry: &'r FilterRegistry, mut factory: F) -> Result<Self>
    where
        F: FnMut(&str) -> Result<S>,
    {
        let mut sinks = Vec::with_capacity(registry.len());
        let mut delivered = Vec::with_capacity(registry.len());
        for name in registry.names() {
            sinks.push(factory(name)?);
            delivered.push((name.to_string(), 0));
        }

        Ok(Self {
            registry,
            sinks,
            passthrough: None,
            stop: None,
            stats: RouteStats {
                delivered,
                ..RouteStats::default()
            },
        })
    }

    /// Also send every non-blank line to `sink`
    pub fn with_passthrough(mut self, sink: S) -> Self {
        self.passthrough = Some(sink);
        self
    }

    /// Stop between lines once `stop` is set
    pub fn with_stop_flag(mut self, stop: Arc<AtomicBool>) -> Self {
        self.stop = Some(stop);
        self
    }

    /// Route a single raw line; returns false if it was blank and skipped
    pub fn route(&mut self, raw: &str) -> Result<bool> {
        self.stats.lines_read += 1;

        let line = raw.trim();
        if line.is_empty() {
            self.stats.blank_skipped += 1;
            return Ok(false);
        }

        if let Some(sink) = self.passthrough.as_mut() {
            sink.accept(line)
                .map_err(|e| FilterError::sink(PASSTHROUGH_CHANNEL, e))?;
            self.stats.passthrough += 1;
        }

        let registry = self.registry;
        for (idx, (name, filter)) in registry.iter().enumerate() {
            if filter.matches(line) {
                self.sinks[idx]
                    .accept(line)
                    .map_err(|e| FilterError::sink(name, e))?;
                self.stats.delivered[idx].1 += 1;
            }
        }

        Ok(true)
    }

    /// Route every line until the input ends or the stop flag is raised
    pub fn process<I, L>(&mut self, lines: I) -> Result<&RouteStats>
    where
        I: IntoIterator<Item = io::Result<L>>,
        L: AsRef<str>,
    {
        for line in lines {
            if self.stop_requested() {
                self.stats.stopped_early = true;
                tracing::info!(lines_read = self.stats.lines_read, "routing stopped early");
                break;
            }
            let line = line.map_err(FilterError::Read)?;
            self.route(line.as_ref())?;
        }

        Ok(&self.stats)
    }

    pub fn stats(&self) -> &RouteStats {
        &self.stats
    }

    /// Flush every sink and hand them back
    ///
    /// All sinks are flushed even if one fails; the first failure is
    /// returned.
    pub fn finish(self) -> Result<Routed<S>> {
        let mut first_err = None;

        let mut passthrough = self.passthrough;
        if let Some(sink) = passthrough.as_mut() {
            if let Err(e) = sink.flush() {
                first_err.get_or_insert(FilterError::sink(PASSTHROUGH_CHANNEL, e));
            }
        }

        let mut channels = Vec::with_capacity(self.sinks.len());
        for ((name, _), mut sink) in self.stats.delivered.iter().zip(self.sinks) {
            if let Err(e) = sink.flush() {
                tracing::warn!(channel = %name, error = %e, "failed to flush sink");
                first_err.get_or_insert(FilterError::sink(name, e));
            }
            channels.push((name.clone(), sink));
        }

        match first_err {
            Some(err) => Err(err),
            None => Ok(Routed {
                channels,
                passthrough,
                stats: self.stats,
            }),
        }
    }

    fn stop_requested(&self) -> bool {
        self.stop
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }
}

/// Open sinks, route all lines and flush, in one call
pub fn route_lines<I, L, S, F>(lines: I, registry: &FilterRegistry, factory: F) -> Result<Routed<S>>
where
    I: IntoIterator<Item = io::Result<L>>,
    L: AsRef<str>,
    S: Sink,
    F: FnMut(&str) -> Result<S>,
{
    let mut router = LineRouter::open(registry, factory)?;
    router.process(lines)?;
    router.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use logsplit_types::{Combinator, FilterSetConfig, RetentionPolicy};

    use crate::buffer::BoundedBuffer;

    fn ok_lines<'a>(lines: &'a [&'a str]) -> impl Iterator<Item = io::Result<&'a str>> + 'a {
        lines.iter().map(|l| Ok(*l))
    }

    fn vec_sink(_: &str) -> Result<Vec<String>> {
        Ok(Vec::new())
    }

    fn alpha_beta() -> FilterRegistry {
        FilterRegistry::build([
            FilterSetConfig::new("A", Combinator::Any).rule("alpha", false),
            FilterSetConfig::new("B", Combinator::Any).rule("beta", false),
        ])
        .unwrap()
    }

    fn channel<'a>(routed: &'a Routed<Vec<String>>, name: &str) -> &'a [String] {
        routed
            .channels
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, lines)| lines.as_slice())
            .unwrap()
    }

    /// Sink that fails on a given line
    struct FailOn(&'static str, Vec<String>);

    impl Sink for FailOn {
        fn accept(&mut self, line: &str) -> io::Result<()> {
            if line == self.0 {
                return Err(io::Error::other("disk full"));
            }
            self.1.push(line.to_string());
            Ok(())
        }
    }

    #[test]
    fn test_end_to_end_two_channels() {
        let registry = alpha_beta();
        let routed = route_lines(
            ok_lines(&["alpha 1", "", "beta 2", "alpha beta 3"]),
            &registry,
            vec_sink,
        )
        .unwrap();

        assert_eq!(channel(&routed, "A"), ["alpha 1", "alpha beta 3"]);
        assert_eq!(channel(&routed, "B"), ["beta 2", "alpha beta 3"]);
        assert_eq!(routed.stats.lines_read, 4);
        assert_eq!(routed.stats.blank_skipped, 1);
        assert_eq!(routed.stats.delivered_to("A"), 2);
        assert_eq!(routed.stats.delivered_to("B"), 2);
    }

    #[test]
    fn test_lines_are_trimmed_and_blanks_skipped_everywhere() {
        let registry = FilterRegistry::build([FilterSetConfig::new("all", Combinator::All)]).unwrap();
        let mut router = LineRouter::open(&registry, vec_sink)
            .unwrap()
            .with_passthrough(Vec::new());

        router
            .process(ok_lines(&["  padded  ", "   ", "\t", "", "x\r"]))
            .unwrap();
        let routed = router.finish().unwrap();

        let original = routed.passthrough.unwrap();
        assert_eq!(original, vec!["padded", "x"]);
        assert_eq!(routed.channels[0].1, vec!["padded", "x"]);
        assert_eq!(routed.stats.blank_skipped, 3);
        assert_eq!(routed.stats.passthrough, 2);
    }

    #[test]
    fn test_sinks_opened_in_registry_order() {
        let registry = FilterRegistry::build([
            FilterSetConfig::new("third", Combinator::Any),
            FilterSetConfig::new("first", Combinator::Any),
            FilterSetConfig::new("second", Combinator::Any),
        ])
        .unwrap();

        let mut opened = Vec::new();
        let router = LineRouter::open(&registry, |name| {
            opened.push(name.to_string());
            Ok(Vec::<String>::new())
        })
        .unwrap();
        drop(router);

        assert_eq!(opened, vec!["third", "first", "second"]);
    }

    #[test]
    fn test_passthrough_gets_unmatched_lines() {
        let registry = alpha_beta();
        let mut router = LineRouter::open(&registry, vec_sink)
            .unwrap()
            .with_passthrough(Vec::new());

        router.process(ok_lines(&["gamma", "alpha"])).unwrap();
        let routed = router.finish().unwrap();

        assert_eq!(routed.passthrough.as_ref().unwrap(), &vec!["gamma", "alpha"]);
        assert_eq!(channel(&routed, "A"), ["alpha"]);
        assert!(channel(&routed, "B").is_empty());
    }

    #[test]
    fn test_bounded_buffer_sinks() {
        let registry = alpha_beta();
        let routed = route_lines(
            ok_lines(&["alpha 1", "alpha 2", "alpha 3", "beta 1"]),
            &registry,
            |_| BoundedBuffer::new(2, RetentionPolicy::KeepLast),
        )
        .unwrap();

        let (_, a) = &routed.channels[0];
        assert_eq!(a.snapshot(), vec!["alpha 2", "alpha 3"]);
        assert_eq!(a.total_added(), 3);
        assert_eq!(routed.stats.delivered_to("A"), 3);
    }

    #[test]
    fn test_boxed_sinks_of_different_kinds() {
        let registry = alpha_beta();
        let routed = route_lines(
            ok_lines(&["alpha 1", "alpha 2", "beta 1"]),
            &registry,
            |name| {
                let sink: Box<dyn Sink> = if name == "A" {
                    Box::new(BoundedBuffer::<String>::new(1, RetentionPolicy::KeepFirst)?)
                } else {
                    Box::new(Vec::<String>::new())
                };
                Ok(sink)
            },
        )
        .unwrap();

        assert_eq!(routed.channels.len(), 2);
        assert_eq!(routed.stats.delivered_to("A"), 2);
        assert_eq!(routed.stats.delivered_to("B"), 1);
    }

    #[test]
    fn test_factory_error_propagates() {
        let registry = alpha_beta();
        let result = LineRouter::open(&registry, |name| {
            if name == "B" {
                Err(FilterError::sink(name, io::Error::other("denied")))
            } else {
                Ok(Vec::<String>::new())
            }
        });
        assert!(matches!(result, Err(FilterError::Sink { channel, .. }) if channel == "B"));
    }

    #[test]
    fn test_sink_write_error_names_channel() {
        let registry = alpha_beta();
        let mut router =
            LineRouter::open(&registry, |_| Ok(FailOn("beta 2", Vec::new()))).unwrap();

        let err = router
            .process(ok_lines(&["alpha 1", "beta 2", "alpha 3"]))
            .unwrap_err();
        assert!(matches!(err, FilterError::Sink { channel, .. } if channel == "B"));
        // lines before the failure were delivered
        assert_eq!(router.stats().delivered_to("A"), 1);
    }

    #[test]
    fn test_read_error_aborts() {
        let registry = alpha_beta();
        let lines: Vec<io::Result<String>> = vec![
            Ok("alpha".to_string()),
            Err(io::Error::other("broken pipe")),
            Ok("alpha again".to_string()),
        ];
        let err = route_lines(lines, &registry, vec_sink).unwrap_err();
        assert!(matches!(err, FilterError::Read(_)));
    }

    #[test]
    fn test_stop_flag_ends_run() {
        let registry = alpha_beta();
        let stop = Arc::new(AtomicBool::new(false));
        let mut router = LineRouter::open(&registry, vec_sink)
            .unwrap()
            .with_stop_flag(stop.clone());

        router.route("alpha 1").unwrap();
        stop.store(true, Ordering::Relaxed);
        let stats = router.process(ok_lines(&["alpha 2"])).unwrap();
        assert!(stats.stopped_early);

        let routed = router.finish().unwrap();
        assert_eq!(channel(&routed, "A"), ["alpha 1"]);
    }

    #[test]
    fn test_delivery_order_follows_input() {
        let registry = FilterRegistry::build([FilterSetConfig::new("n", Combinator::Any)
            .rule(r"^\d+$", true)])
        .unwrap();
        let input: Vec<String> = (0..50).map(|i| i.to_string()).collect();
        let routed = route_lines(input.iter().map(|l| Ok(l.as_str())), &registry, vec_sink).unwrap();
        assert_eq!(routed.channels[0].1, input);
    }
}
