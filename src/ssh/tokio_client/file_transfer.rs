// Copyright 2025 Lablup Inc. and Jeongkyu Shin
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! SFTP file upload.

use russh_sftp::{client::SftpSession, protocol::OpenFlags};
use std::path::Path;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use super::connection::Client;

/// Size of each chunk copied from the local file to the remote file.
pub const UPLOAD_CHUNK_SIZE: usize = 32 * 1024;

impl Client {
    /// Upload a file with sftp to the remote server.
    ///
    /// Each call opens its own SFTP channel, so uploads may run concurrently
    /// over one connection. Returns the number of bytes written.
    ///
    /// The remote sshd must have the sftp subsystem enabled
    /// (`Subsystem sftp internal-sftp` or the sftp-server binary).
    pub async fn upload_file<T: AsRef<Path>, U: Into<String>>(
        &self,
        src_file_path: T,
        // russh-sftp takes remote paths as String
        dest_file_path: U,
    ) -> Result<u64, super::Error> {
        // open the local file first so a missing file costs no channel
        let mut local_file = tokio::fs::File::open(src_file_path.as_ref())
            .await
            .map_err(super::Error::IoError)?;

        let channel = self.get_channel().await?;
        channel.request_subsystem(true, "sftp").await?;
        let sftp = SftpSession::new(channel.into_stream()).await?;

        let mut remote_file = sftp
            .open_with_flags(
                dest_file_path,
                OpenFlags::CREATE | OpenFlags::TRUNCATE | OpenFlags::WRITE,
            )
            .await?;

        let written = copy_chunked(&mut local_file, &mut remote_file).await?;
        remote_file.shutdown().await.map_err(super::Error::IoError)?;
        sftp.close().await?;

        Ok(written)
    }
}

/// Copy `reader` into `writer` in [`UPLOAD_CHUNK_SIZE`] chunks until EOF,
/// then flush. Only the bytes actually read are written.
pub async fn copy_chunked<R, W>(reader: &mut R, writer: &mut W) -> Result<u64, super::Error>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut buf = vec![0u8; UPLOAD_CHUNK_SIZE];
    let mut total = 0u64;
    loop {
        let n = reader.read(&mut buf).await.map_err(super::Error::IoError)?;
        if n == 0 {
            break;
        }
        writer
            .write_all(&buf[..n])
            .await
            .map_err(super::Error::IoError)?;
        total += n as u64;
    }
    writer.flush().await.map_err(super::Error::IoError)?;
    Ok(total)
}
