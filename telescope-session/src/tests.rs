#[cfg(test)]
mod round_trip {
    use std::collections::HashMap;

    use telescope_types::{FrameType, LogLevel, SessionType};

    use crate::archive::{read_archive, write_archive};
    use crate::session::Session;

    #[test]
    fn session_round_trip_preserves_frame_bytes_and_metrics() {
        let dir = tempfile::tempdir().unwrap();
        let session = Session::new(
            SessionType::Observation,
            Some("Andromeda Galaxy NGC 224".to_string()),
            None,
            None,
        );
        assert!(session.session_id.starts_with("observation_andromeda_galaxy_"));

        session.log(LogLevel::Info, "session start", None).unwrap();
        let frame_data = vec![1u8, 2, 3, 4, 5, 6, 7, 8];
        session
            .add_frame("main", FrameType::Light, frame_data.clone(), "uint16", 2, 2, HashMap::new())
            .unwrap();

        let archive = session.close().unwrap();
        assert_eq!(archive.observability.metrics.frames_captured, 1);

        let path = write_archive(dir.path(), &archive).unwrap();
        assert!(path.exists());

        let reopened = read_archive(&path).unwrap();
        assert_eq!(reopened.meta.session_id, archive.meta.session_id);
        assert_eq!(reopened.cameras["main"].light[0].data, frame_data);
        assert_eq!(reopened.observability.metrics.frames_captured, 1);
    }

    #[test]
    fn mutation_after_close_is_rejected() {
        let session = Session::new(SessionType::Maintenance, None, None, None);
        session.close().unwrap();
        let err = session.log(LogLevel::Info, "too late", None).unwrap_err();
        assert_eq!(err.kind(), telescope_types::ErrorKind::SessionClosed);

        let err = session.add_event("too late", None).unwrap_err();
        assert_eq!(err.kind(), telescope_types::ErrorKind::SessionClosed);
    }
}
