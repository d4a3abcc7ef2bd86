use std::collections::HashMap;

use anyhow::Context;
use crossbeam_channel::{Sender, TrySendError};

use crate::audio::SampleBuffer;
use crate::audio_api::{next_sample_id, AudioCommand, SampleId, SoundPlayer, TriggerParams};
use crate::catalog::client::CatalogClient;
use crate::pipeline::project::SoundRef;

const DEFAULT_GAIN: f32 = 0.8;

// Fetch a sound from the catalog service and decode it, ready for registration with the engine
pub fn load(
    client: &CatalogClient,
    sound: &SoundRef,
    target_rate: u32,
) -> anyhow::Result<(SampleId, SampleBuffer)> {
    let extension = sound
        .extension()
        .with_context(|| format!("{sound} has no file extension"))?;
    let bytes = client.fetch_sound(sound)?;
    let buffer = SampleBuffer::decode(&bytes, extension, target_rate)
        .with_context(|| format!("decoding {sound}"))?;
    Ok((next_sample_id(), buffer))
}

/// Plays catalog sounds through the audio engine. Each sound is fetched and
/// decoded once, then every trigger is just a message to the audio thread.
///
/// A sound that can't be fetched or decoded is remembered as failed, so its
/// triggers fail straight away instead of going back to the network. Only an
/// explicit `prepare` (the sound being applied to a pad again) or
/// `forget_failures` (a catalog reload) tries it again.
pub struct SamplePlayer {
    client: CatalogClient,
    audio_tx: Sender<AudioCommand>,
    sample_rate: u32,
    loaded: HashMap<SoundRef, SampleId>,
    failed: HashMap<SoundRef, String>, // sound -> why it didn't load
}

impl SamplePlayer {
    pub fn new(client: CatalogClient, audio_tx: Sender<AudioCommand>, sample_rate: u32) -> Self {
        Self {
            client,
            audio_tx,
            sample_rate,
            loaded: HashMap::new(),
            failed: HashMap::new(),
        }
    }

    pub fn forget_failures(&mut self) {
        if !self.failed.is_empty() {
            log::debug!("retrying {} failed sounds on next use", self.failed.len());
        }
        self.failed.clear();
    }

    fn send(&self, cmd: AudioCommand) -> anyhow::Result<()> {
        match self.audio_tx.try_send(cmd) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => anyhow::bail!("audio command queue is full"),
            Err(TrySendError::Disconnected(_)) => anyhow::bail!("audio engine is gone"),
        }
    }

    fn sample_for(&mut self, sound: &SoundRef) -> anyhow::Result<SampleId> {
        if let Some(&id) = self.loaded.get(sound) {
            return Ok(id);
        }
        if let Some(reason) = self.failed.get(sound) {
            anyhow::bail!("{sound} did not load: {reason}");
        }
        let (id, buffer) = match load(&self.client, sound, self.sample_rate) {
            Ok(loaded) => loaded,
            Err(e) => {
                self.failed.insert(sound.clone(), format!("{e:#}"));
                return Err(e);
            }
        };
        log::info!("loaded {sound} ({} frames)", buffer.len());
        self.send(AudioCommand::RegisterSample { id, buffer })?;
        self.loaded.insert(sound.clone(), id);
        Ok(id)
    }
}

impl SoundPlayer for SamplePlayer {
    // an explicit request, so a sound that failed before gets another go
    fn prepare(&mut self, sound: &SoundRef) -> anyhow::Result<()> {
        self.failed.remove(sound);
        self.sample_for(sound).map(|_| ())
    }

    // a sound that was never prepared gets loaded here, on its first trigger
    fn play(&mut self, sound: &SoundRef) -> anyhow::Result<()> {
        let sample_id = self.sample_for(sound)?;
        self.send(AudioCommand::Trigger(TriggerParams {
            sample_id,
            gain: DEFAULT_GAIN,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::server::CatalogServer;
    use crate::catalog::test_support::{temp_dir, write_click_wav};
    use crossbeam_channel::Receiver;
    use std::io::{BufRead, BufReader, Write};
    use std::net::{SocketAddr, TcpListener};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn player_for(files: &[&str]) -> (SamplePlayer, Receiver<AudioCommand>) {
        let dir = temp_dir("steppad_loader");
        for name in files {
            if name.ends_with(".wav") {
                write_click_wav(&dir.join(name), 44100);
            } else {
                std::fs::write(dir.join(name), b"not really audio").unwrap();
            }
        }
        let server = CatalogServer::bind("127.0.0.1:0".parse().unwrap(), dir).unwrap();
        let client = CatalogClient::new(server.local_addr().unwrap());
        server.spawn().unwrap();
        let (tx, rx) = crossbeam_channel::unbounded();
        (SamplePlayer::new(client, tx, 44100), rx)
    }

    #[test]
    fn first_play_registers_then_triggers() {
        let (mut player, rx) = player_for(&["kick.wav"]);
        let kick = SoundRef::from_catalog_entry("kick.wav");

        player.play(&kick).unwrap();
        player.play(&kick).unwrap();

        let cmds: Vec<AudioCommand> = rx.try_iter().collect();
        assert_eq!(cmds.len(), 3);
        let AudioCommand::RegisterSample { id, buffer } = &cmds[0] else {
            panic!("expected a registration first, got {:?}", cmds[0]);
        };
        assert_eq!(buffer.len(), 64);
        for cmd in &cmds[1..] {
            let AudioCommand::Trigger(t) = cmd else {
                panic!("expected a trigger, got {cmd:?}");
            };
            assert_eq!(t.sample_id, *id);
        }
    }

    #[test]
    fn prepare_loads_once() {
        let (mut player, rx) = player_for(&["kick.wav"]);
        let kick = SoundRef::from_catalog_entry("kick.wav");
        player.prepare(&kick).unwrap();
        player.prepare(&kick).unwrap();
        assert_eq!(rx.try_iter().count(), 1);
    }

    #[test]
    fn undecodable_or_missing_sounds_fail_cleanly() {
        let (mut player, rx) = player_for(&["broken.mp3"]);
        assert!(player.play(&SoundRef::from_catalog_entry("broken.mp3")).is_err());
        assert!(player.play(&SoundRef::from_catalog_entry("missing.wav")).is_err());
        assert_eq!(rx.try_iter().count(), 0);
    }

    // answers every request with `body` and counts the connections it got
    fn counting_server(body: &'static [u8]) -> (SocketAddr, Arc<AtomicUsize>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        std::thread::spawn(move || {
            for stream in listener.incoming() {
                let stream = stream.unwrap();
                counter.fetch_add(1, Ordering::SeqCst);
                let mut reader = BufReader::new(&stream);
                let mut line = String::new();
                loop {
                    line.clear();
                    if reader.read_line(&mut line).unwrap() <= 2 {
                        break;
                    }
                }
                let head = format!(
                    "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                    body.len()
                );
                let mut writer = &stream;
                writer.write_all(head.as_bytes()).unwrap();
                writer.write_all(body).unwrap();
            }
        });
        (addr, hits)
    }

    #[test]
    fn a_broken_sound_is_fetched_once_however_often_it_triggers() {
        let (addr, hits) = counting_server(b"not really audio");
        let (tx, rx) = crossbeam_channel::unbounded();
        let mut player = SamplePlayer::new(CatalogClient::new(addr), tx, 44100);
        let broken = SoundRef::from_catalog_entry("broken.wav");

        for _ in 0..16 {
            assert!(player.play(&broken).is_err());
        }
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(rx.try_iter().count(), 0);

        // applying it to a pad again is an explicit retry
        assert!(player.prepare(&broken).is_err());
        assert_eq!(hits.load(Ordering::SeqCst), 2);
        assert!(player.play(&broken).is_err());
        assert_eq!(hits.load(Ordering::SeqCst), 2);

        player.forget_failures();
        assert!(player.play(&broken).is_err());
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn full_queue_is_an_error_not_a_block() {
        let dir = temp_dir("steppad_loader_full");
        write_click_wav(&dir.join("kick.wav"), 44100);
        let server = CatalogServer::bind("127.0.0.1:0".parse().unwrap(), dir).unwrap();
        let client = CatalogClient::new(server.local_addr().unwrap());
        server.spawn().unwrap();

        let (tx, _rx) = crossbeam_channel::bounded(1);
        let mut player = SamplePlayer::new(client, tx, 44100);
        let kick = SoundRef::from_catalog_entry("kick.wav");
        player.prepare(&kick).unwrap(); // fills the queue
        assert!(player.play(&kick).is_err());
    }
}
